//! Persistence module
//!
//! SQLite-backed storage for hub configurations.

pub mod config_store;
pub mod connection;
pub mod migrations;

pub use config_store::SqliteConfigStore;
pub use connection::{ConnectionPool, DatabaseError, PooledConn, create_pool};

use std::sync::Arc;

use application::ports::ConfigStore;

use crate::config::DatabaseConfig;

/// Open the SQLite hub store described by `config`
pub fn open_config_store(config: &DatabaseConfig) -> Result<Arc<dyn ConfigStore>, DatabaseError> {
    let pool = create_pool(config)?;
    Ok(Arc::new(SqliteConfigStore::new(Arc::new(pool))))
}
