//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the long-lived collaborators (upstream client, response cache)
//! - Assemble the HTTP server from an already validated configuration
//!
//! # Design Decisions
//! - Fail fast on invalid settings: a bad upstream secret or redis URL is fatal
//! - Reachability of redis is not checked here; it is dialed on first use
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use crate::cache::{self, CacheError};
use crate::config::{ConfigError, ProxyConfig};
use crate::http::HttpServer;
use crate::upstream::{HttpUpstream, UpstreamError};

/// Error raised before the server accepts traffic.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("upstream client error: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("response cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Create the networked collaborators and the server that uses them.
pub async fn build_server(config: ProxyConfig) -> Result<HttpServer, StartupError> {
    let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
    tracing::debug!(
        uri = %config.upstream.uri,
        max_connections_per_host = config.upstream.max_connections_per_host,
        "Upstream client ready"
    );

    let cache = cache::from_config(&config.cache).await?;

    Ok(HttpServer::new(config, upstream, cache)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    use crate::config::CacheBackendKind;

    const QUERY: &str = r#"{"query":"{ users { id } }"}"#;
    const DATA: &str = r#"{"data":{"users":[]}}"#;

    #[tokio::test]
    async fn test_build_without_cache() {
        let mut config = ProxyConfig::default();
        config.upstream.uri = "http://127.0.0.1:1/v1/graphql".into();

        let server = build_server(config).await.unwrap();
        assert!(!server.config().cache.enabled);
    }

    #[tokio::test]
    async fn test_build_with_memory_cache() {
        let mut config = ProxyConfig::default();
        config.upstream.uri = "http://127.0.0.1:1/v1/graphql".into();
        config.cache.enabled = true;
        config.cache.backend = CacheBackendKind::Memory;

        assert!(build_server(config).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_redis_host_fails_startup() {
        let mut config = ProxyConfig::default();
        config.upstream.uri = "http://127.0.0.1:1/v1/graphql".into();
        config.cache.enabled = true;
        config.cache.host = "bad host:port:6379".into();

        let err = build_server(config).await.err().unwrap();
        assert!(matches!(err, StartupError::Cache(_)));
    }

    #[tokio::test]
    async fn test_unreachable_redis_still_proxies() {
        let (uri, calls) = start_upstream().await;
        let mut config = ProxyConfig::default();
        config.upstream.uri = uri;
        config.cache.enabled = true;
        config.cache.host = "127.0.0.1:1".into();

        let server = build_server(config).await.unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .body(Body::from(QUERY))
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, DATA);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    async fn start_upstream() -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/v1/graphql",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    DATA
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{}/v1/graphql", addr), calls)
    }
}
