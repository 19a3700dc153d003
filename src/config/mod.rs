//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks, all errors collected)
//!     → ServerConfig (validated, immutable)
//!     → handed to the endpoint supervisor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the access policy and limiter are
//!   built from it exactly once
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, BootstrapUser, DemuxConfig, HttpConfig, ListenerConfig, ObservabilityConfig, PaginationConfig,
    RateLimitConfig, RpcConfig, ServerConfig, ShutdownConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
