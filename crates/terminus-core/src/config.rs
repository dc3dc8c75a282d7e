// ── Runtime configuration ──
//
// The values the resource layer reads at run time. Built by the config
// crate (or directly by a caller) and handed in; core never reads files.

use std::time::Duration;

use terminus_api::DEFAULT_BASE_URL;
use url::Url;

/// Host name of the production platform.
pub const DEFAULT_HOST: &str = "terminus.pantheon.io";

/// strftime pattern used for backup and workflow dates.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct TerminusConfig {
    /// API root, e.g. `https://terminus.pantheon.io/api/`.
    pub base_url: Url,
    /// Host override; anything other than [`DEFAULT_HOST`] selects a
    /// non-production backup bucket.
    pub host: Option<String>,
    /// strftime pattern for rendered dates.
    pub date_format: String,
    /// Request timeout handed to the transport.
    pub timeout: Duration,
}

impl TerminusConfig {
    /// The configured host when it differs from production.
    pub fn storage_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .filter(|host| !host.is_empty() && *host != DEFAULT_HOST)
    }
}

impl Default for TerminusConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            host: None,
            date_format: DEFAULT_DATE_FORMAT.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_host_is_not_an_override() {
        let mut config = TerminusConfig::default();
        assert_eq!(config.storage_host(), None);

        config.host = Some(DEFAULT_HOST.into());
        assert_eq!(config.storage_host(), None);

        config.host = Some("onebox".into());
        assert_eq!(config.storage_host(), Some("onebox"));
    }
}
