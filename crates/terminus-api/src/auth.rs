// Machine-token authentication
//
// The platform trades a long-lived machine token for a short-lived
// session token. Every later request carries the session as a bearer
// token; the user id travels with it so user-scoped paths can be built.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::TerminusClient;
use crate::error::Error;

/// An authenticated platform session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token sent on every request.
    pub token: SecretString,
    /// Id of the user the session belongs to.
    pub user_id: String,
    /// When the platform will stop honoring the token.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Returns `true` once `expires_at` lies in the past.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Wire shape of `POST authorize/machine-token`.
#[derive(Deserialize)]
struct SessionResponse {
    session: String,
    user_id: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl TerminusClient {
    /// Exchange a machine token for a session.
    ///
    /// `POST authorize/machine-token` with `{machine_token, client}`. The
    /// session is stored on the client and returned to the caller.
    pub async fn login_with_machine_token(
        &self,
        machine_token: &SecretString,
    ) -> Result<Session, Error> {
        let url = self.api_url("authorize/machine-token")?;
        debug!("logging in at {}", url);

        let body = json!({
            "machine_token": machine_token.expose_secret(),
            "client": "terminus",
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("machine token rejected (HTTP {status}): {body}"),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: SessionResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        let session = Session {
            token: SecretString::from(parsed.session),
            user_id: parsed.user_id,
            expires_at: parsed
                .expires_at
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        };
        self.set_session(session.clone());

        debug!(user_id = %session.user_id, "login successful");
        Ok(session)
    }
}
