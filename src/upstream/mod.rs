//! Upstream GraphQL client subsystem.
//!
//! # Responsibilities
//! - Describe the one request shape sent upstream (POST, JSON, shared secret)
//! - Send it and hand back the response or a transport error
//!
//! # Design Decisions
//! - The caller's headers are never forwarded; only the body is copied
//! - The response status is carried but not interpreted here
//! - No retries: one attempt per inbound request
//! - Implementations sit behind [`UpstreamClient`] so tests can swap in
//!   [`RecordingUpstream`]

pub mod http;
pub mod recording;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;

use crate::config::UpstreamConfig;

pub use self::http::HttpUpstream;
pub use self::recording::RecordingUpstream;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error from building the upstream client or from an upstream call that did
/// not complete.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream client setup failed: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid upstream secret header: {0}")]
    InvalidHeader(String),
    /// No response arrived: connect, TLS, or send failure.
    #[error("upstream request failed: {0}")]
    Transport(#[source] BoxError),
    /// A response started but its body could not be read in full.
    #[error("upstream response body read failed: {0}")]
    BodyRead(#[source] BoxError),
}

/// Where and how upstream requests are addressed. Built once at startup.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    uri: String,
    secret_header: HeaderName,
    secret: HeaderValue,
}

impl UpstreamTarget {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let secret_header = HeaderName::from_bytes(config.secret_header.as_bytes())
            .map_err(|e| UpstreamError::InvalidHeader(e.to_string()))?;
        let mut secret = HeaderValue::from_str(&config.secret)
            .map_err(|e| UpstreamError::InvalidHeader(e.to_string()))?;
        secret.set_sensitive(true);

        Ok(Self {
            uri: config.uri.clone(),
            secret_header,
            secret,
        })
    }
}

/// A request to the upstream GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    /// Build the upstream copy of an inbound GraphQL POST.
    ///
    /// The body is passed through byte for byte.
    pub fn graphql(target: &UpstreamTarget, body: Bytes) -> Self {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(target.secret_header.clone(), target.secret.clone());

        Self {
            method: Method::POST,
            uri: target.uri.clone(),
            headers,
            body,
        }
    }
}

/// A completed upstream exchange.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Sends requests to the upstream GraphQL endpoint.
#[async_trait]
pub trait UpstreamClient: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}
