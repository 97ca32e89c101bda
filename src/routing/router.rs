//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Classify a request by method and path
//! - Return exactly one route, with an explicit no-match
//!
//! # Design Decisions
//! - Pure function of (method, path); no state, no locks
//! - Path comparison is exact and case-sensitive
//! - Preflight is answered for every path

use axum::http::Method;

/// Path of the GraphQL endpoint.
pub const GRAPHQL_PATH: &str = "/graphql";

/// The handler selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `POST /graphql`
    Graphql,
    /// `OPTIONS` on any path
    Preflight,
    /// Anything else
    NotFound,
}

impl Route {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Graphql => "graphql",
            Route::Preflight => "preflight",
            Route::NotFound => "not_found",
        }
    }
}

/// Select the route for a request.
pub fn classify(method: &Method, path: &str) -> Route {
    if method == Method::POST && path == GRAPHQL_PATH {
        Route::Graphql
    } else if method == Method::OPTIONS {
        Route::Preflight
    } else {
        Route::NotFound
    }
}
