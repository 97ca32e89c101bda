//! Networked upstream client.

use async_trait::async_trait;

use super::{UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse};
use crate::config::UpstreamConfig;

/// Upstream client backed by a pooled `reqwest::Client`.
///
/// Created once at startup and shared by every handler.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_connections_per_host)
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .request(request.method, &request.uri)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.into()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::BodyRead(e.into()))?;

        Ok(UpstreamResponse { status, body })
    }
}
