//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports: departure backends on top of
//! `integration_departures`, and hub storage in SQLite or memory. Also owns
//! configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, DatabaseConfig, LoggingConfig, PollingConfig};
pub use persistence::{
    ConnectionPool, DatabaseError, SqliteConfigStore, create_pool, open_config_store,
};
pub use telemetry::{TelemetryError, init_logging};
