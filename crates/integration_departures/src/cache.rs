//! TTL cache for slow-changing lookups (stop search, lines at a stop)

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::config::ApiConfig;

const MAX_ENTRIES: u64 = 500;

/// Optional in-memory cache keyed by request
#[derive(Debug, Clone)]
pub(crate) struct LookupCache<V: Clone + Send + Sync + 'static> {
    inner: Option<Cache<String, V>>,
}

impl<V: Clone + Send + Sync + 'static> LookupCache<V> {
    pub(crate) fn from_config(config: &ApiConfig) -> Self {
        let inner = config.caching_enabled().then(|| {
            Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(Duration::from_secs(u64::from(config.cache_ttl_minutes) * 60))
                .build()
        });
        Self { inner }
    }

    pub(crate) async fn get(&self, key: &str) -> Option<V> {
        let cache = self.inner.as_ref()?;
        let hit = cache.get(key).await;
        if hit.is_some() {
            debug!(key, "Lookup cache hit");
        }
        hit
    }

    pub(crate) async fn insert(&self, key: String, value: V) {
        if let Some(cache) = &self.inner {
            cache.insert(key, value).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let cache = LookupCache::<u32>::from_config(&ApiConfig::for_testing("http://x"));
        cache.insert("a".into(), 1).await;
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn enabled_cache_returns_value() {
        let cache = LookupCache::<u32>::from_config(&ApiConfig::default());
        cache.insert("a".into(), 1).await;
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, None);
    }
}
