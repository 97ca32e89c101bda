//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single dispatching handler
//! - Wire up middleware (tracing, body limit, request ID)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::{cors, graphql, response};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{self, Route};
use crate::upstream::{UpstreamClient, UpstreamError, UpstreamTarget};

/// Application state injected into handlers.
///
/// Everything here is created once at startup and shared by all requests.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn UpstreamClient>,
    pub cache: Arc<dyn ResponseCache>,
    pub target: Arc<UpstreamTarget>,
    pub cache_ttl: Duration,
    pub max_body_bytes: usize,
}

/// HTTP server for the GraphQL proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server from a configuration and its collaborators.
    pub fn new(
        config: ProxyConfig,
        upstream: Arc<dyn UpstreamClient>,
        cache: Arc<dyn ResponseCache>,
    ) -> Result<Self, UpstreamError> {
        let state = AppState {
            upstream,
            cache,
            target: Arc::new(UpstreamTarget::from_config(&config.upstream)?),
            cache_ttl: config.cache.ttl(),
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request.headers()),
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes));

        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(middleware)
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown receiver fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.uri,
            cache_enabled = self.config.cache.enabled,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::notified(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Entry point for every request: classify, then hand to exactly one handler.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let route = routing::classify(request.method(), request.uri().path());

    let response = match route {
        Route::Graphql => graphql::handle(&state, request).await,
        Route::Preflight => cors::preflight(),
        Route::NotFound => response::not_found(),
    };

    metrics::record_request(route.as_str(), response.status().as_u16());
    response
}
