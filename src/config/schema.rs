//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the content server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, concurrency).
    pub listener: ListenerConfig,

    /// Content root and static assets.
    pub content: ContentConfig,

    /// Limits for code artifacts.
    pub scripts: ScriptConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits and CORS.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum requests served concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Where content comes from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Directory holding the numbered layers.
    pub root: PathBuf,

    /// Directory of static assets served ahead of the cascade.
    pub static_dir: Option<PathBuf>,

    /// Fail requests instead of serving nothing when the root is missing.
    pub require_root: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("content"),
            static_dir: Some(PathBuf::from("static")),
            require_root: false,
        }
    }
}

impl ContentConfig {
    /// Resolve relative directories against `base` (normally the cwd).
    pub fn resolve_relative_to(&mut self, base: &std::path::Path) {
        if self.root.is_relative() {
            self.root = base.join(&self.root);
        }
        if let Some(dir) = self.static_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

/// Interpreter limits for code artifacts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Maximum operations per entry point call (0 = unlimited).
    pub max_operations: u64,

    /// Maximum function call depth.
    pub max_call_levels: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_operations: 0,
            max_call_levels: 64,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (whole cascade plus response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request hardening.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Answer cross-origin requests (any origin).
    pub cors_enabled: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 5 * 1024 * 1024, // 5MB
            cors_enabled: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str("[content]\nroot = \"site\"\n").unwrap();
        assert_eq!(config.content.root, PathBuf::from("site"));
        assert_eq!(config.content.static_dir, Some(PathBuf::from("static")));
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.scripts.max_call_levels, 64);
        assert!(config.security.cors_enabled);
    }

    #[test]
    fn test_resolve_relative_dirs() {
        let mut content = ContentConfig {
            root: PathBuf::from("content"),
            static_dir: Some(PathBuf::from("/srv/static")),
            require_root: false,
        };
        content.resolve_relative_to(Path::new("/srv/app"));
        assert_eq!(content.root, PathBuf::from("/srv/app/content"));
        assert_eq!(content.static_dir, Some(PathBuf::from("/srv/static")));
    }
}
