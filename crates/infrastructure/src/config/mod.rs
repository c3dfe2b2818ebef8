//! Application configuration
//!
//! Split into focused sub-modules:
//! - `polling`: poll interval and request sizing
//! - `database`: SQLite settings
//! - `logging`: log filter and format
//!
//! API client settings reuse [`integration_departures::ApiConfig`].
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `departures.toml` in the working directory (optional), or an explicit file
//! 3. environment variables, e.g. `DEPARTURES_API__TIMEOUT_SECS=5` or
//!    `DEPARTURES_POLLING__TIMES_PER_LINE=3`

mod database;
mod logging;
mod polling;

use std::path::Path;

use integration_departures::ApiConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use database::DatabaseConfig;
pub use logging::LoggingConfig;
pub use polling::PollingConfig;

/// Default config file name, looked up without extension
pub const DEFAULT_CONFIG_FILE: &str = "departures";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "DEPARTURES";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Departure API client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling schedule
    #[serde(default)]
    pub polling: PollingConfig,

    /// Hub storage
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the optional file and the environment
    ///
    /// With `path == None`, `departures.toml` is read when present.
    /// An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(
            path,
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate().map_err(config::ConfigError::Message)?;
        debug!(api = %config.api.base_url, db = %config.database.path, "Configuration loaded");
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.api.validate()?;
        self.polling.validate()?;
        self.database.validate()?;
        self.logging.validate()
    }

    /// Client settings for a hub's API URL
    #[must_use]
    pub fn api_for(&self, base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            ..self.api.clone()
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
