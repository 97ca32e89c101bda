//! Cache used when response caching is disabled.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{CacheError, CacheKey, ResponseCache};

/// Always misses; every store succeeds and is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl ResponseCache for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &CacheKey, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}
