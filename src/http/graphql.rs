//! GraphQL proxy handler.
//!
//! # Responsibilities
//! - Serve a GraphQL POST from the response cache when possible
//! - Otherwise forward it upstream, store the result, and return it
//!
//! # Design Decisions
//! - A hit needs a successful, non-empty lookup; lookup errors count as misses
//! - Only completed upstream calls are cached, whatever their GraphQL payload
//! - Cache store failures are logged and never change the response

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::cache::CacheKey;
use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics::{self, CacheLookup};
use crate::upstream::UpstreamRequest;

/// Read the request body and proxy it.
pub async fn handle(state: &AppState, request: Request<Body>) -> Response {
    let request_id = request_id(request.headers()).to_string();

    let body = match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    proxy(state, &request_id, body).await
}

/// Answer a GraphQL request body from the cache or the upstream.
pub async fn proxy(state: &AppState, request_id: &str, body: Bytes) -> Response {
    let key = CacheKey::from_body(&body);

    if let Some(cached) = lookup(state, request_id, &key).await {
        return response::graphql(cached);
    }

    let start = Instant::now();
    let upstream_response = match state
        .upstream
        .send(UpstreamRequest::graphql(&state.target, body))
        .await
    {
        Ok(r) => r,
        Err(e) => {
            metrics::record_upstream(start, false);
            tracing::error!(request_id = %request_id, error = %e, "Upstream request failed");
            return response::upstream_failure();
        }
    };
    metrics::record_upstream(start, true);

    tracing::debug!(
        request_id = %request_id,
        status = %upstream_response.status,
        bytes = upstream_response.body.len(),
        "Upstream responded"
    );

    if let Err(e) = state
        .cache
        .set(&key, upstream_response.body.clone(), state.cache_ttl)
        .await
    {
        metrics::record_cache_store_failure();
        tracing::warn!(request_id = %request_id, error = %e, "Cannot cache the result");
    }

    response::graphql(upstream_response.body)
}

async fn lookup(state: &AppState, request_id: &str, key: &CacheKey) -> Option<Bytes> {
    match state.cache.get(key).await {
        Ok(Some(body)) if !body.is_empty() => {
            metrics::record_cache_lookup(CacheLookup::Hit);
            tracing::debug!(request_id = %request_id, bytes = body.len(), "Cache hit");
            Some(body)
        }
        Ok(_) => {
            metrics::record_cache_lookup(CacheLookup::Miss);
            None
        }
        Err(e) => {
            metrics::record_cache_lookup(CacheLookup::Error);
            tracing::debug!(request_id = %request_id, error = %e, "Cache lookup failed, forwarding upstream");
            None
        }
    }
}
