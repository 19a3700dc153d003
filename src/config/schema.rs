//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the dual-protocol server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Shared listening socket (bind address, TLS, connection limit).
    pub listener: ListenerConfig,

    /// Connection classification.
    pub demux: DemuxConfig,

    /// Binary RPC server settings.
    pub rpc: RpcConfig,

    /// JSON gateway settings.
    pub http: HttpConfig,

    pub shutdown: ShutdownConfig,

    /// Session token signing.
    pub auth: AuthConfig,

    pub rate_limit: RateLimitConfig,

    pub pagination: PaginationConfig,

    /// Method → role names; replaces built-in entries for the same method.
    pub access_policy: BTreeMap<String, Vec<String>>,

    pub observability: ObservabilityConfig,

    /// Accounts created at startup.
    pub bootstrap_users: Vec<BootstrapUser>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemuxConfig {
    /// How long a new connection may take to send enough bytes to classify.
    pub classify_timeout_ms: u64,

    /// Route connections that match neither protocol to the RPC server
    /// instead of dropping them. Needed when an external TLS terminator
    /// sits in front and forwards opaque streams.
    pub fallback_to_rpc: bool,
}

impl Default for DemuxConfig {
    fn default() -> Self {
        Self {
            classify_timeout_ms: 5_000,
            fallback_to_rpc: false,
        }
    }
}

impl DemuxConfig {
    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Upper bound on any single RPC connection's lifetime.
    pub max_connection_age_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            max_connection_age_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for the JSON gateway.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 5,
            max_body_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight calls to finish once shutdown starts.
    pub grace_period_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_period_secs: 10 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 key for session tokens. Must be set.
    pub signing_key: String,

    pub token_ttl_secs: u64,

    /// bcrypt cost for stored passwords.
    pub password_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            token_ttl_secs: 900,
            password_cost: 10,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Calls admitted per window.
    pub quota: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            quota: 20,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Fixed page-token salt; time-seeded when absent.
    pub salt: Option<String>,

    pub default_page_size: usize,

    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            salt: None,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Register the call-logging observer.
    pub log_calls: bool,

    /// Also log request metadata for each observed call.
    pub verbose: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_calls: true,
            verbose: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapUser {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Role name, case-insensitive.
    pub role: String,
}
