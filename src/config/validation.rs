//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts >= 1, delays > 0)
//! - Validate addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a deserialized configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.storage.file_path.trim().is_empty() {
        errors.push(ValidationError::new("storage.file_path", "must not be empty"));
    }
    if config.storage.key_prefix.is_empty() {
        errors.push(ValidationError::new("storage.key_prefix", "must not be empty"));
    }

    if config.kv.reconnect_step_ms == 0 {
        errors.push(ValidationError::new("kv.reconnect_step_ms", "must be > 0"));
    }
    if config.kv.reconnect_max_delay_ms < config.kv.reconnect_step_ms {
        errors.push(ValidationError::new(
            "kv.reconnect_max_delay_ms",
            "must be >= kv.reconnect_step_ms",
        ));
    }
    if config.kv.reconnect_max_attempts == 0 {
        errors.push(ValidationError::new("kv.reconnect_max_attempts", "must be >= 1"));
    }
    if config.kv.probe_ttl_secs == 0 {
        errors.push(ValidationError::new("kv.probe_ttl_secs", "must be > 0"));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be >= 1"));
    }
    if config.retry.initial_delay_ms == 0 {
        errors.push(ValidationError::new("retry.initial_delay_ms", "must be > 0"));
    }

    if let Some(base_url) = &config.content.base_url {
        if let Err(e) = url::Url::parse(base_url) {
            errors.push(ValidationError::new("content.base_url", e.to_string()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
