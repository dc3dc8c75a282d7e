// terminus-api: Async Rust client for the Pantheon platform API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::Session;
pub use client::{DEFAULT_BASE_URL, Method, RequestOptions, Response, TerminusClient};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
