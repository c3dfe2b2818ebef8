//! Departure API client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Public Motis instance used when nothing else is configured
pub const DEFAULT_MOTIS_URL: &str = "https://api.transitous.org/api";

/// Configuration for one departures API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL commands are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a failed request
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between attempts in milliseconds (0 retries immediately)
    #[serde(default)]
    pub retry_delay_ms: u64,

    /// Cache TTL for stop and line lookups in minutes (0 to disable caching)
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_MOTIS_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_retries() -> u32 {
    3
}

const fn default_cache_ttl_minutes() -> u32 {
    60
}

/// `departures/<version> (<repository>)`
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "departures/{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY")
    )
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: 0,
            cache_ttl_minutes: default_cache_ttl_minutes(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with the default settings
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 2,
            retries: 0,
            cache_ttl_minutes: 0,
            ..Self::default()
        }
    }

    /// Per-request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between attempts
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Check if caching is enabled
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_minutes > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        let url = Url::parse(&self.base_url).map_err(|e| format!("invalid base_url: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported base_url scheme: {}", url.scheme()));
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        if self.retries > 10 {
            return Err("retries must be 10 or less".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, DEFAULT_MOTIS_URL);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.retries, 3);
        assert_eq!(config.retry_delay(), Duration::ZERO);
        assert!(config.caching_enabled());
        assert!(config.user_agent.starts_with("departures/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn testing_config() {
        let config = ApiConfig::for_testing("http://127.0.0.1:9");
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.retries, 0);
        assert!(!config.caching_enabled());
    }

    #[test]
    fn validation_rejects_bad_urls() {
        assert!(ApiConfig::with_base_url("").validate().is_err());
        assert!(ApiConfig::with_base_url("not a url").validate().is_err());
        assert!(ApiConfig::with_base_url("ftp://example.org").validate().is_err());
    }

    #[test]
    fn validation_zero_timeout() {
        let config = ApiConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_too_many_retries() {
        let config = ApiConfig {
            retries: 11,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ApiConfig =
            serde_json::from_str(r#"{ "base_url": "https://efa.vgn.de/vgnExt_oeffi" }"#).unwrap();
        assert_eq!(config.base_url, "https://efa.vgn.de/vgnExt_oeffi");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.retries, 3);
    }
}
