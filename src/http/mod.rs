//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID)
//!     → routing::classify
//!         → graphql.rs (cache lookup / upstream / cache store)
//!         → cors.rs (preflight)
//!         → response.rs (not found)
//!     → Send to client
//! ```

pub mod cors;
pub mod graphql;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
