//! Redis-backed response cache.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::{ConnectionLike, ConnectionManager, ConnectionManagerConfig};
use redis::{Client, Cmd};
use tokio::sync::OnceCell;

use super::{CacheError, CacheKey, ResponseCache};

const CONNECT_RETRIES: usize = 1;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);
const CONNECT_BUDGET: Duration = Duration::from_secs(3);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Response cache stored in redis with `SET ... EX`.
///
/// The connection is opened on first use, not at construction, so an
/// unreachable server costs a cache miss per request instead of the process.
/// After a failed attempt, calls fail fast for [`RECONNECT_BACKOFF`] before
/// the next attempt. Once open, the connection manager multiplexes commands
/// over one connection and reconnects on failure; clones share that connection.
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    last_failure: Arc<Mutex<Option<Instant>>>,
    url: String,
}

impl RedisCache {
    /// Validate `url` and prepare a client. No connection is made yet.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;

        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
            last_failure: Arc::new(Mutex::new(None)),
            url: url.to_string(),
        })
    }

    /// Whether the managed connection has been established.
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self.connection.get_or_try_init(|| self.connect()).await?;
        Ok(manager.clone())
    }

    async fn connect(&self) -> Result<ConnectionManager, CacheError> {
        if self.in_backoff() {
            return Err(CacheError::Unavailable);
        }

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(CONNECT_RETRIES)
            .set_connection_timeout(CONNECT_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);
        let attempt = ConnectionManager::new_with_config(self.client.clone(), config);

        let result = match tokio::time::timeout(CONNECT_BUDGET, attempt).await {
            Ok(Ok(manager)) => Ok(manager),
            Ok(Err(e)) => Err(CacheError::from(e)),
            Err(_) => Err(CacheError::ConnectTimeout(CONNECT_BUDGET)),
        };

        match &result {
            Ok(_) => tracing::info!(url = %self.url, "Redis cache connected"),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Redis connection failed");
                if let Ok(mut last_failure) = self.last_failure.lock() {
                    *last_failure = Some(Instant::now());
                }
            }
        }

        result
    }

    fn in_backoff(&self) -> bool {
        self.last_failure
            .lock()
            .ok()
            .and_then(|last_failure| *last_failure)
            .is_some_and(|at| at.elapsed() < RECONNECT_BACKOFF)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        let mut connection = self.connection().await?;
        fetch(&mut connection, key).await
    }

    async fn set(&self, key: &CacheKey, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        store(&mut connection, key, &value, ttl).await
    }
}

/// Seconds for `EX`, which rejects zero; sub-second TTLs round up to one.
pub fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

fn get_command(key: &CacheKey) -> Cmd {
    let mut cmd = redis::cmd("GET");
    cmd.arg(key.as_str());
    cmd
}

fn set_command(key: &CacheKey, value: &[u8], ttl: Duration) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key.as_str())
        .arg(value)
        .arg("EX")
        .arg(expiry_seconds(ttl));
    cmd
}

async fn fetch<C>(connection: &mut C, key: &CacheKey) -> Result<Option<Bytes>, CacheError>
where
    C: ConnectionLike + Send,
{
    let value: Option<Vec<u8>> = get_command(key).query_async(connection).await?;
    Ok(value.map(Bytes::from))
}

async fn store<C>(
    connection: &mut C,
    key: &CacheKey,
    value: &[u8],
    ttl: Duration,
) -> Result<(), CacheError>
where
    C: ConnectionLike + Send,
{
    set_command(key, value, ttl)
        .query_async::<()>(connection)
        .await?;
    Ok(())
}
