use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache value rejected: {0}")]
    Rejected(String),
}

/// Key/value store shared by the certificate and token caches.
///
/// A missing key is `Ok(None)`, never an error. Eviction after `ttl` is the
/// backend's responsibility.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn save(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache: key -> (value, expiry)
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.inner.read().await.values().filter(|e| e.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop expired entries. `save` does this on every write too.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.inner.write().await.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        let map = self.inner.read().await;
        Ok(map
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone()))
    }

    async fn save(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Rejected(format!("ttl {:?} out of range", ttl)))?;
        let now = Instant::now();
        let mut map = self.inner.write().await;
        map.retain(|_, entry| entry.expires_at > now);
        map.insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache.save("short", "val".into(), Duration::from_millis(200)).await.unwrap();
        cache.save("long", "val".into(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.fetch("short").await.unwrap().as_deref(), Some("val"));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(cache.fetch("short").await.unwrap().is_none());
        assert!(cache.fetch("long").await.unwrap().is_some());

        cache.purge_expired().await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn writes_drop_expired_entries() {
        let cache = MemoryCache::new();
        for client in 0..5 {
            cache
                .save(&format!("client-{}", client), "val".into(), Duration::from_millis(100))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        cache.save("fresh", "val".into(), Duration::from_secs(60)).await.unwrap();

        let stored = cache.inner.read().await;
        assert_eq!(stored.len(), 1);
        assert!(stored.contains_key("fresh"));
    }

    #[tokio::test]
    async fn missing_key_is_not_an_error() {
        let cache = MemoryCache::new();
        assert!(cache.fetch("absent").await.unwrap().is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let cache = MemoryCache::new();
        cache.save("k", "first".into(), Duration::from_secs(60)).await.unwrap();
        cache.save("k", "second".into(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.fetch("k").await.unwrap().as_deref(), Some("second"));
    }
}
