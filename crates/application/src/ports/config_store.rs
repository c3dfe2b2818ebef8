//! Configuration storage port
//!
//! Persists hub configurations as JSON documents under string keys.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::error::ApplicationError;

/// Port for key/value configuration storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the document stored under `key`
    async fn get(&self, key: &str) -> Result<Option<Value>, ApplicationError>;

    /// Insert or replace the document under `key`
    async fn put(&self, key: &str, value: &Value) -> Result<(), ApplicationError>;

    /// Delete `key`; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool, ApplicationError>;

    /// All keys starting with `prefix`, sorted
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, ApplicationError>;
}
