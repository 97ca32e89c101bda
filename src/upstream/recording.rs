//! Recording upstream for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;

use super::{UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse};

#[derive(Debug, Clone)]
enum Reply {
    Respond(StatusCode, Bytes),
    Fail(String),
}

/// Upstream double that records every request and answers with a fixed reply.
///
/// Clones share the recorded requests, so a test can keep one handle while the
/// server owns another.
#[derive(Debug, Clone)]
pub struct RecordingUpstream {
    reply: Reply,
    requests: Arc<Mutex<Vec<UpstreamRequest>>>,
}

impl RecordingUpstream {
    /// Answer every request with `status` and `body`.
    pub fn responding(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::with_reply(Reply::Respond(status, body.into()))
    }

    /// Fail every request as if the upstream were unreachable.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self::with_reply(Reply::Fail(reason.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copies of the requests received so far, oldest first.
    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl UpstreamClient for RecordingUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        match &self.reply {
            Reply::Respond(status, body) => Ok(UpstreamResponse {
                status: *status,
                body: body.clone(),
            }),
            Reply::Fail(reason) => Err(UpstreamError::Transport(reason.clone().into())),
        }
    }
}
