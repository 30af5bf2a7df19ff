//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional, overrides inherited env vars)
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PORT env var, CLI flags (overrides)
//!     → ServerConfig (validated, immutable)
//!     → cloned into the HTTP server and compositor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; content itself is re-read per request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_port_override, load_config, load_env_file, ConfigError};
pub use schema::ServerConfig;
pub use schema::{
    ContentConfig, ListenerConfig, ObservabilityConfig, ScriptConfig, SecurityConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
