//! Networked key-value backend.
//!
//! Two interchangeable clients implement [`KvClient`]:
//! - [`rest::RestKv`]: managed REST endpoint, stateless per call
//! - [`connection::ConnectionKv`]: one shared, lazily opened connection with
//!   its own reconnect policy
//!
//! Only one is built per process, chosen by [`crate::config::StorageEnv::kv_connection`].
//! Counters live under `<prefix><slug>` as integer strings; the increment is
//! delegated to the remote `INCR`, which is atomic on the server.

pub mod connection;
pub mod rest;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{KvConfig, KvConnection};
use crate::resilience::ReconnectPolicy;

pub use connection::ConnectionKv;
pub use rest::RestKv;

/// Errors talking to the networked KV store.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("KV connection lost after {attempts} attempts: {source}")]
    Disconnected {
        attempts: u32,
        #[source]
        source: redis::RedisError,
    },

    #[error("KV REST request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("KV REST endpoint returned an error: {0}")]
    Remote(String),

    #[error("unexpected value for key '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("invalid KV URL: {0}")]
    InvalidUrl(String),

    #[error("networked KV backend is not configured")]
    NotConfigured,
}

/// Minimal command set the counter service needs from a KV store.
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Short client name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Read an integer counter; `None` when the key is absent.
    async fn get_count(&self, key: &str) -> Result<Option<u64>, KvError>;

    /// Atomically add one and return the new value.
    async fn incr(&self, key: &str) -> Result<u64, KvError>;

    async fn get_string(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError>;

    async fn delete(&self, key: &str) -> Result<(), KvError>;
}

/// Build the client for the configured connection.
pub fn build_client(
    connection: &KvConnection,
    config: &KvConfig,
) -> Result<Arc<dyn KvClient>, KvError> {
    match connection {
        KvConnection::Rest { url, token } => Ok(Arc::new(RestKv::new(url, token, config)?)),
        KvConnection::Direct { url } => Ok(Arc::new(ConnectionKv::open(
            url,
            ReconnectPolicy::from_config(config),
        )?)),
    }
}

/// Result of the diagnostics write/read/delete cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub accessible: bool,
    pub error: Option<String>,
}

/// Counter view over a [`KvClient`].
#[derive(Clone)]
pub struct KvStore {
    client: Arc<dyn KvClient>,
    prefix: String,
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("client", &self.client.name())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl KvStore {
    pub fn new(client: Arc<dyn KvClient>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    pub fn client_name(&self) -> &'static str {
        self.client.name()
    }

    pub fn key(&self, slug: &str) -> String {
        format!("{}{}", self.prefix, slug)
    }

    pub async fn get(&self, slug: &str) -> Result<u64, KvError> {
        Ok(self.client.get_count(&self.key(slug)).await?.unwrap_or(0))
    }

    pub async fn increment(&self, slug: &str) -> Result<u64, KvError> {
        self.client.incr(&self.key(slug)).await
    }

    /// Write a short-lived key, read it back, delete it. Never touches counters.
    pub async fn probe(&self, config: &KvConfig) -> ProbeOutcome {
        let key = config.probe_key.as_str();
        let expected = config.probe_value.as_str();

        let cycle = async {
            self.client
                .set_with_expiry(key, expected, config.probe_ttl_secs)
                .await?;
            let value = self.client.get_string(key).await?;
            if value.as_deref() == Some(expected) {
                self.client.delete(key).await?;
                Ok::<bool, KvError>(true)
            } else {
                Ok(false)
            }
        };

        match cycle.await {
            Ok(true) => ProbeOutcome {
                accessible: true,
                error: None,
            },
            Ok(false) => ProbeOutcome {
                accessible: false,
                error: Some("Test write/read failed".to_string()),
            },
            Err(e) => {
                tracing::warn!(client = self.client.name(), error = %e, "KV probe failed");
                ProbeOutcome {
                    accessible: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Parse a stored counter value.
pub(crate) fn parse_count(key: &str, raw: &str) -> Result<u64, KvError> {
    raw.trim().parse().map_err(|_| KvError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
