//! In-process response cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{CacheError, CacheKey, ResponseCache};

#[derive(Debug, Clone)]
struct Entry {
    body: Bytes,
    expires_at: Instant,
}

/// A thread-safe, expiring map of cache key -> response body.
///
/// Expired entries are dropped lazily when read. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<CacheKey, Entry>>,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner
            .get(key)
            .map(|entry| entry.expires_at > Instant::now())
            .unwrap_or(false)
    }

    /// Number of stored entries, including ones that expired but were not read yet.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let now = Instant::now();
        let expired = match self.inner.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.body.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.inner.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(
            key.clone(),
            Entry {
                body: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = MemoryCache::new();
        let key = CacheKey::from_body(br#"{"query":"{ a }"}"#);

        assert!(cache.get(&key).await.unwrap().is_none());

        cache
            .set(&key, Bytes::from_static(b"first"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(Bytes::from_static(b"first")));
        assert!(cache.contains(&key));

        // Last write wins
        cache
            .set(&key, Bytes::from_static(b"second"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get(&key).await.unwrap(), Some(Bytes::from_static(b"second")));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = MemoryCache::new();
        let key = CacheKey::from_body(b"short-lived");

        cache
            .set(&key, Bytes::from_static(b"value"), Duration::from_millis(20))
            .await
            .unwrap();
        assert!(cache.contains(&key));

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!cache.contains(&key));
        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        let key = CacheKey::from_body(b"shared");

        other
            .set(&key, Bytes::from_static(b"v"), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.contains(&key));
    }
}
