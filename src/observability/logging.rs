//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Pick the output format from the deployment environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (`RUST_LOG` wins)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Environment, ProxyConfig};

/// Default filter directives for an environment.
pub fn default_filter(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => "graphql_cache_proxy=info,tower_http=info",
        Environment::Development => "graphql_cache_proxy=debug,tower_http=debug",
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(config: &ProxyConfig) {
    let fallback = config
        .observability
        .log_level
        .clone()
        .unwrap_or_else(|| default_filter(config.environment).to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let result = if config.environment.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
