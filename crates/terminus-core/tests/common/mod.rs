// Shared fixtures for terminus-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use url::Url;
use wiremock::MockServer;

use terminus_api::TerminusClient;
use terminus_core::Record;

// ── Gateway ─────────────────────────────────────────────────────────

pub async fn setup() -> (MockServer, TerminusClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    let client = TerminusClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

// ── Log capture ─────────────────────────────────────────────────────

/// One event emitted by the crate under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub level: Level,
    pub message: String,
    /// Every structured field other than the message, rendered with `Debug`
    /// (so `%`-captured values appear in their `Display` form).
    pub fields: BTreeMap<String, String>,
}

impl Captured {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Records every `terminus_core` event into a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureLayer {
    pub fn events(&self) -> Vec<Captured> {
        self.events.lock().unwrap().clone()
    }

    /// Level and message of each event, for order-sensitive comparisons.
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.events()
            .into_iter()
            .map(|event| (event.level, event.message))
            .collect()
    }

    /// Install as the thread-local subscriber for the returned guard's lifetime.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with("terminus_core") || *meta.level() == Level::DEBUG {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(Captured {
            level: *meta.level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.insert(field.name().to_owned(), rendered);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.message);
        } else {
            self.fields.insert(field.name().to_owned(), value.to_owned());
        }
    }
}
