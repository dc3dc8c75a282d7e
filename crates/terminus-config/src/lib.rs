//! Configuration for terminus tools.
//!
//! One TOML file plus `TERMINUS_*` environment overrides, machine-token
//! resolution (env + keyring + plaintext), and translation into
//! `terminus_core::TerminusConfig` and `terminus_api::TransportConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use terminus_api::{TlsMode, TransportConfig};
use terminus_core::{DEFAULT_DATE_FORMAT, DEFAULT_HOST, TerminusConfig};

/// Environment variable consulted first for the machine token.
pub const MACHINE_TOKEN_ENV: &str = "TERMINUS_MACHINE_TOKEN";

const KEYRING_SERVICE: &str = "terminus";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no machine token configured; set {MACHINE_TOKEN_ENV} or run auth:login")]
    NoCredentials,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Contents of `config.toml`. Every key can be overridden by the
/// upper-cased `TERMINUS_` environment variable of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// API host name.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// strftime pattern for rendered dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Email the saved machine token belongs to; selects the keyring entry.
    pub user: Option<String>,

    /// Machine token (plaintext, prefer the keyring or env var).
    pub machine_token: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            protocol: default_protocol(),
            port: default_port(),
            date_format: default_date_format(),
            timeout: default_timeout(),
            user: None,
            machine_token: None,
            ca_cert: None,
            insecure: false,
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.into()
}
fn default_protocol() -> String {
    "https".into()
}
fn default_port() -> u16 {
    443
}
fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.into()
}
fn default_timeout() -> u64 {
    30
}

impl Config {
    /// `{protocol}://{host}:{port}/api/`
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = format!("{}://{}:{}/api/", self.protocol, self.host, self.port);
        Url::parse(&raw).map_err(|e| ConfigError::Validation {
            field: "host".into(),
            reason: format!("'{raw}' is not a valid URL: {e}"),
        })
    }

    /// Runtime settings for the resource layer.
    pub fn to_terminus_config(&self) -> Result<TerminusConfig, ConfigError> {
        if self.date_format.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "date_format".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(TerminusConfig {
            base_url: self.base_url()?,
            host: Some(self.host.clone()),
            date_format: self.date_format.clone(),
            timeout: Duration::from_secs(self.timeout),
        })
    }

    /// TLS and timeout settings for the HTTP client.
    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "pantheon", "terminus").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".terminus");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus environment. A missing file is not
/// an error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TERMINUS_"));

    Ok(figment.extract()?)
}

/// Serialize the config to TOML at the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Machine token resolution ────────────────────────────────────────

/// Resolve the machine token: env var, then keyring, then plaintext config.
pub fn resolve_machine_token(cfg: &Config) -> Result<SecretString, ConfigError> {
    // 1. Environment
    if let Ok(token) = std::env::var(MACHINE_TOKEN_ENV) {
        if !token.is_empty() {
            return Ok(SecretString::from(token));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(cfg)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = cfg.machine_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials)
}

/// Save a machine token to the system keyring.
pub fn store_machine_token(cfg: &Config, token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(cfg))
        .and_then(|entry| entry.set_password(token))
        .map_err(|e| ConfigError::Validation {
            field: "machine_token".into(),
            reason: format!("keyring unavailable: {e}"),
        })
}

fn keyring_user(cfg: &Config) -> String {
    format!(
        "machine-token/{}",
        cfg.user.as_deref().unwrap_or("default")
    )
}
