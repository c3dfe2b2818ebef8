//! In-memory config store
//!
//! Used for throwaway runs and for tests that need a
//! working `ConfigStore` without SQLite.

use std::collections::BTreeMap;

use application::error::ApplicationError;
use application::ports::ConfigStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

/// Config store holding documents in a sorted map
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryConfigStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, ApplicationError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &Value) -> Result<(), ApplicationError> {
        self.entries.write().insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, ApplicationError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, ApplicationError> {
        Ok(self
            .entries
            .read()
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
