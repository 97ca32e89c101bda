//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the upstream URI and listener address
//! - Validate value ranges (TTL > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::{CacheBackendKind, ProxyConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.upstream.uri.is_empty() {
        errors.push(ValidationError::new("upstream.uri", "must be set"));
    } else {
        match Url::parse(&config.upstream.uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "upstream.uri",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("upstream.uri", e.to_string())),
        }
    }

    if HeaderName::from_bytes(config.upstream.secret_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "upstream.secret_header",
            format!("'{}' is not a valid header name", config.upstream.secret_header),
        ));
    }

    if config.upstream.max_connections_per_host == 0 {
        errors.push(ValidationError::new(
            "upstream.max_connections_per_host",
            "must be greater than zero",
        ));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than zero"));
    }

    if config.cache.enabled
        && config.cache.backend == CacheBackendKind::Redis
        && config.cache.host.trim().is_empty()
    {
        errors.push(ValidationError::new(
            "cache.host",
            "must be set when the redis cache is enabled",
        ));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "limits.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
