//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! raw request body
//!     → CacheKey (base64, reversible)
//!     → ResponseCache::get  → hit: replay stored body
//!                           → miss / error: forward upstream
//!     → ResponseCache::set  (only after a completed upstream call)
//! ```
//!
//! # Design Decisions
//! - Keys are the full encoded body, not a digest; no namespace prefix
//! - One trait, three stores: redis, in-process memory, no-op
//! - A disabled cache is the no-op store, so callers never branch on "enabled"
//! - Lookup and store failures are returned, never panicked on; callers decide
//! - Redis is dialed lazily; an unreachable server is a miss, never fatal

pub mod memory;
pub mod noop;
pub mod redis_cache;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::config::{CacheBackendKind, CacheConfig};

pub use self::memory::MemoryCache;
pub use self::noop::NoopCache;
pub use self::redis_cache::RedisCache;

/// Error returned by a cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("redis connection not established within {0:?}")]
    ConnectTimeout(Duration),
    #[error("redis unavailable, retrying after backoff")]
    Unavailable,
}

/// Cache key derived from the exact bytes of a request body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Encode a request body with standard (padded) base64.
    pub fn from_body(body: &[u8]) -> Self {
        Self(STANDARD.encode(body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the request body this key was built from.
    pub fn decode(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.0).ok()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key-value store for upstream response bodies.
#[async_trait]
pub trait ResponseCache: Send + Sync + fmt::Debug {
    /// Look up a stored body. `Ok(None)` means the key is absent.
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError>;

    /// Store a body that expires after `ttl`.
    async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError>;
}

/// Build the cache selected by the configuration.
///
/// A disabled cache yields [`NoopCache`]. Only the redis URL is checked here;
/// the connection is opened by the first lookup, so an unreachable host
/// degrades to cache misses instead of failing startup.
pub async fn from_config(config: &CacheConfig) -> Result<Arc<dyn ResponseCache>, CacheError> {
    if !config.enabled {
        tracing::info!("Response cache disabled");
        return Ok(Arc::new(NoopCache));
    }

    let cache: Arc<dyn ResponseCache> = match config.backend {
        CacheBackendKind::Redis => Arc::new(RedisCache::new(&config.redis_url())?),
        CacheBackendKind::Memory => Arc::new(MemoryCache::new()),
    };

    tracing::info!(
        backend = ?config.backend,
        ttl_secs = config.ttl_secs,
        "Response cache enabled"
    );

    Ok(cache)
}
