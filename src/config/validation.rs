//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (quota > 0, timeouts > 0, addresses parse)
//! - Check role names in the access policy and bootstrap users
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - A zero quota is rejected here: running without a limiter is a
//!   configuration error, never a silent bypass

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::security::Role;

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut check = |ok: bool, field: &str, message: &str| {
        if !ok {
            errors.push(ValidationError::new(field, message));
        }
    };

    check(
        config.listener.bind_address.parse::<SocketAddr>().is_ok(),
        "listener.bind_address",
        "must be a socket address",
    );
    check(config.listener.max_connections > 0, "listener.max_connections", "must be > 0");
    if let Some(tls) = &config.listener.tls {
        check(!tls.cert_path.trim().is_empty(), "listener.tls.cert_path", "must not be empty");
        check(!tls.key_path.trim().is_empty(), "listener.tls.key_path", "must not be empty");
    }

    check(config.demux.classify_timeout_ms > 0, "demux.classify_timeout_ms", "must be > 0");
    check(config.rpc.max_connection_age_secs > 0, "rpc.max_connection_age_secs", "must be > 0");
    check(config.http.request_timeout_secs > 0, "http.request_timeout_secs", "must be > 0");
    check(config.shutdown.grace_period_secs > 0, "shutdown.grace_period_secs", "must be > 0");

    check(!config.auth.signing_key.trim().is_empty(), "auth.signing_key", "must be set");
    check(config.auth.token_ttl_secs > 0, "auth.token_ttl_secs", "must be > 0");
    check(
        (4..=31).contains(&config.auth.password_cost),
        "auth.password_cost",
        "must be between 4 and 31",
    );

    check(config.rate_limit.quota > 0, "rate_limit.quota", "must be > 0");
    check(config.rate_limit.window_secs > 0, "rate_limit.window_secs", "must be > 0");

    check(config.pagination.default_page_size > 0, "pagination.default_page_size", "must be > 0");
    check(
        config.pagination.default_page_size <= config.pagination.max_page_size,
        "pagination.max_page_size",
        "must be >= default_page_size",
    );

    if config.observability.metrics_enabled {
        check(
            config.observability.metrics_address.parse::<SocketAddr>().is_ok(),
            "observability.metrics_address",
            "must be a socket address",
        );
    }

    for (method, roles) in &config.access_policy {
        let field = format!("access_policy.{method:?}");
        check(method.starts_with('/'), &field, "method must be fully qualified");
        check(!roles.is_empty(), &field, "must list at least one role");
        for role in roles {
            check(role.parse::<Role>().is_ok(), &field, &format!("unknown role `{role}`"));
        }
    }

    for (i, user) in config.bootstrap_users.iter().enumerate() {
        let field = format!("bootstrap_users[{i}]");
        check(!user.username.trim().is_empty(), &field, "username must be set");
        check(!user.password.is_empty(), &field, "password must be set");
        check(user.role.parse::<Role>().is_ok(), &field, &format!("unknown role `{}`", user.role));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
