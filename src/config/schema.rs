//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Root configuration for the GraphQL cache proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single upstream GraphQL endpoint.
    pub upstream: UpstreamConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Deployment environment. Only affects log output.
    pub environment: Environment,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Inbound request limits.
    pub limits: LimitsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream GraphQL endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute URI of the upstream GraphQL endpoint.
    pub uri: String,

    /// Static shared secret forwarded on every upstream call.
    pub secret: String,

    /// Header carrying the secret.
    pub secret_header: String,

    /// Maximum persistent connections kept per upstream host.
    pub max_connections_per_host: usize,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            secret: String::new(),
            secret_header: "x-hasura-admin-secret".to_string(),
            max_connections_per_host: 1024,
            connect_timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Which store backs the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Redis,
    Memory,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching.
    pub enabled: bool,

    /// Backend store.
    pub backend: CacheBackendKind,

    /// Redis address, either `host:port` or a `redis://` URL.
    pub host: String,

    /// Expiry applied to every stored entry, in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: CacheBackendKind::Redis,
            host: "127.0.0.1:6379".to_string(),
            ttl_secs: 24 * 60 * 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Connection URL for the redis client.
    pub fn redis_url(&self) -> String {
        if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("redis://{}", self.host)
        }
    }
}

/// Deployment environment.
///
/// Anything other than `production` is treated as development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(rename = "dev")]
    Development,
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Self {
        if name == "production" {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Environment::from_name(&name))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("dev"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter override (e.g. "debug", "graphql_cache_proxy=trace").
    pub log_level: Option<String>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Inbound request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}
