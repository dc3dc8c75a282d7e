// Platform API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, bearer-session handling,
// and response decoding. Every call returns the decoded JSON body as
// `Response::data`; status handling and error mapping live here so that
// resource code above only ever sees data or a typed `Error`.

use std::sync::RwLock;

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Default public endpoint of the platform API.
pub const DEFAULT_BASE_URL: &str = "https://terminus.pantheon.io:443/api/";

/// HTTP verb of a gateway request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Verb and optional body of a gateway request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Sent as the JSON request body.
    pub form_params: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(form_params: Value) -> Self {
        Self {
            method: Method::Post,
            form_params: Some(form_params),
        }
    }

    pub fn put(form_params: Value) -> Self {
        Self {
            method: Method::Put,
            form_params: Some(form_params),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            form_params: None,
        }
    }
}

/// Decoded response of a successful request.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    /// Decoded JSON body; `Null` for empty bodies.
    pub data: Value,
}

/// HTTP client for the platform API.
///
/// Holds the current session behind a lock so that a single client can
/// be shared by every model of one invocation.
pub struct TerminusClient {
    http: reqwest::Client,
    base_url: Url,
    session: RwLock<Option<Session>>,
}

impl TerminusClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `https://terminus.pantheon.io/api/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            session: RwLock::new(None),
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The API base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Session management ───────────────────────────────────────────

    /// Install a session obtained elsewhere (e.g. from a session cache).
    pub fn set_session(&self, session: Session) {
        *self.session.write().expect("session lock poisoned") = Some(session);
    }

    /// Drop the current session.
    pub fn clear_session(&self) {
        *self.session.write().expect("session lock poisoned") = None;
    }

    /// A copy of the current session, if logged in.
    pub fn session(&self) -> Option<Session> {
        self.session.read().expect("session lock poisoned").clone()
    }

    /// Id of the logged-in user.
    pub fn user_id(&self) -> Result<String, Error> {
        self.session()
            .map(|s| s.user_id)
            .ok_or(Error::NotLoggedIn)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Build the full URL for an API path such as `sites/{id}/environments`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Send one request and decode its body.
    ///
    /// Non-success statuses become typed errors; the body of a success
    /// response is returned as-is under `data`.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Response, Error> {
        let url = self.api_url(path)?;
        debug!(method = ?options.method, "{}", url);

        let mut builder = self.http.request(options.method.as_reqwest(), url);
        if let Some(ref body) = options.form_params {
            builder = builder.json(body);
        }
        if let Some(session) = self.session() {
            builder = builder.bearer_auth(session.token.expose_secret());
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        self.decode(path, resp).await
    }

    /// Map the status line, then decode the JSON body.
    async fn decode(&self, path: &str, resp: reqwest::Response) -> Result<Response, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            self.clear_session();
            return Err(Error::Authentication {
                message: format!("session rejected (HTTP {status})"),
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                path: path.to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let data = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?
        };

        Ok(Response {
            status: status.as_u16(),
            data,
        })
    }
}

/// `Url::join` drops the last segment unless the base ends with `/`.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
