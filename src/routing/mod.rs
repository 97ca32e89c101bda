//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (classify)
//!     → Graphql | Preflight | NotFound
//! ```
//!
//! # Design Decisions
//! - Routes are fixed; there is nothing to configure
//! - Deterministic: same input always matches same route
//! - First match wins (GraphQL POST before preflight)

pub mod router;

pub use router::{classify, Route, GRAPHQL_PATH};
