//! Response construction.
//!
//! # Responsibilities
//! - Build the client response for a replayed or freshly fetched body
//! - Map upstream and routing failures to status codes
//!
//! # Design Decisions
//! - The upstream status is not propagated; a completed call answers 200
//! - GraphQL `errors` payloads are passed through like any other body
//! - Upstream transport failures answer 400 with an empty body

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::http::cors;

pub const NOT_FOUND_BODY: &str = "Request not found";

/// 200 with CORS headers and the body verbatim.
pub fn graphql(body: Bytes) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    cors::apply_shared(headers);
    response
}

pub fn upstream_failure() -> Response {
    StatusCode::BAD_REQUEST.into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}
