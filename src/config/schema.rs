//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the view
//! counter service. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the view counter service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Local storage settings (file backend, key layout).
    pub storage: StorageConfig,

    /// Networked key-value store settings.
    pub kv: KvConfig,

    /// Retry-with-backoff settings for upstream content fetches.
    pub retry: RetryConfig,

    /// Upstream page content source.
    pub content: ContentConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Diagnostics probe settings.
    pub diagnostics: DiagnosticsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Counter file, relative to the process working directory.
    pub file_path: String,

    /// Prefix prepended to the slug for networked KV keys.
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file_path: ".view-counts.json".to_string(),
            key_prefix: "views:".to_string(),
        }
    }
}

/// Networked key-value store configuration.
///
/// Connection credentials never live here; they are read from the
/// environment (see [`crate::config::env::StorageEnv`]).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KvConfig {
    /// Reconnect delay grows by this step per attempt, in milliseconds.
    pub reconnect_step_ms: u64,

    /// Upper bound on a single reconnect delay, in milliseconds.
    pub reconnect_max_delay_ms: u64,

    /// Consecutive failed reconnect attempts before giving up.
    pub reconnect_max_attempts: u32,

    /// REST client per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Key written by the diagnostics probe.
    pub probe_key: String,

    /// Value written by the diagnostics probe.
    pub probe_value: String,

    /// Expiry of the probe key in seconds.
    pub probe_ttl_secs: u64,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            reconnect_step_ms: 100,
            reconnect_max_delay_ms: 3000,
            reconnect_max_attempts: 10,
            request_timeout_secs: 10,
            probe_key: "view-count-test".to_string(),
            probe_value: "test".to_string(),
            probe_ttl_secs: 10,
        }
    }
}

/// Retry configuration for transient upstream failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds; doubles afterwards.
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// Upstream page content configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Base URL of the page content source. Page routes are disabled when unset.
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: 15,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pick from the runtime environment: json in production, pretty otherwise.
    Auto,
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Auto,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Diagnostics probe configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Expose the probe outside development. `ALLOW_VIEW_COUNT_DEBUG=true`
    /// has the same effect.
    pub allow: bool,
}
