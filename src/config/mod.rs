//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → Overrides (flags / deployment env vars)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed by value to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no global settings are read mid-request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, Overrides};
pub use schema::CacheBackendKind;
pub use schema::CacheConfig;
pub use schema::Environment;
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::UpstreamConfig;
