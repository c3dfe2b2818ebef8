//! SQLite config store implementation
//!
//! Implements the ConfigStore port on the `config_entries` table. Values are
//! stored as JSON text.

use std::sync::Arc;

use application::{error::ApplicationError, ports::ConfigStore};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use tokio::task;
use tracing::{debug, instrument};

use super::connection::{ConnectionPool, PooledConn};

/// SQLite-based configuration store
#[derive(Debug, Clone)]
pub struct SqliteConfigStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteConfigStore {
    /// Create a new SQLite config store
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, ApplicationError>
    where
        T: Send + 'static,
        F: FnOnce(&PooledConn) -> Result<T, ApplicationError> + Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_error)?;
            f(&conn)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}

fn storage_error(e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Storage(e.to_string())
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Value>, ApplicationError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let text: Option<String> = conn
                .query_row(
                    "SELECT value FROM config_entries WHERE key = ?1",
                    [&key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_error)?;

            text.map(|t| {
                serde_json::from_str(&t)
                    .map_err(|e| ApplicationError::Storage(format!("entry '{key}': {e}")))
            })
            .transpose()
        })
        .await
    }

    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: &Value) -> Result<(), ApplicationError> {
        let key = key.to_string();
        let text = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO config_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, text, Utc::now().to_rfc3339()],
            )
            .map_err(storage_error)?;
            debug!("Stored config entry");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool, ApplicationError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let removed = conn
                .execute("DELETE FROM config_entries WHERE key = ?1", [&key])
                .map_err(storage_error)?;
            Ok(removed > 0)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, ApplicationError> {
        let prefix = prefix.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare("SELECT key FROM config_entries WHERE substr(key, 1, ?2) = ?1 ORDER BY key")
                .map_err(storage_error)?;
            let count = i64::try_from(prefix.chars().count()).map_err(storage_error)?;
            let keys = stmt
                .query_map(params![prefix, count], |row| row.get::<_, String>(0))
                .map_err(storage_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage_error)?;
            Ok(keys)
        })
        .await
    }
}
