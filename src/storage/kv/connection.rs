//! Connection-oriented KV client.
//!
//! # Lifecycle
//! ```text
//! first call(s) ──▶ OnceCell init (one connect loop, racing callers wait on it)
//!                       │
//!                       ▼
//!               ArcSwap<MultiplexedConnection>  ◀── shared by every call
//!                       │
//!   command fails with a dropped connection
//!                       ▼
//!               reconnect (serialised, generation-checked) ──▶ swap ──▶ rerun command once
//! ```
//!
//! Connect attempts follow [`ReconnectPolicy`]: `min(n * 100ms, 3s)` between
//! attempts, giving up after 10 consecutive failures. The connection lives
//! for the rest of the process once opened.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError, RedisResult};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::observability::metrics;
use crate::resilience::ReconnectPolicy;
use crate::storage::kv::{parse_count, KvClient, KvError};

pub struct ConnectionKv {
    client: redis::Client,
    policy: ReconnectPolicy,
    connection: OnceCell<ArcSwap<MultiplexedConnection>>,
    generation: AtomicU64,
    reconnecting: Mutex<()>,
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
}

impl ConnectionKv {
    /// Parse `url`. No connection is made until the first command.
    pub fn open(url: &str, policy: ReconnectPolicy) -> Result<Self, KvError> {
        let client = redis::Client::open(url).map_err(|e| KvError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client,
            policy,
            connection: OnceCell::new(),
            generation: AtomicU64::new(0),
            reconnecting: Mutex::new(()),
        })
    }

    /// Number of connections opened so far.
    pub fn connections_opened(&self) -> u64 {
        match self.connection.get() {
            Some(_) => self.generation.load(Ordering::Acquire) + 1,
            None => 0,
        }
    }

    async fn connect(&self) -> Result<MultiplexedConnection, KvError> {
        let mut failures = 0;
        loop {
            match self.client.get_multiplexed_async_connection().await {
                Ok(conn) => {
                    metrics::record_reconnect("connected");
                    if failures > 0 {
                        tracing::info!(failures, "KV connection re-established");
                    }
                    return Ok(conn);
                }
                Err(e) => {
                    failures += 1;
                    let delay = if failures < self.policy.max_attempts() {
                        self.policy.delay_for_attempt(failures)
                    } else {
                        None
                    };
                    let Some(delay) = delay else {
                        metrics::record_reconnect("gave_up");
                        tracing::error!(attempts = failures, error = %e, "KV connection failed, giving up");
                        return Err(KvError::Disconnected {
                            attempts: failures,
                            source: e,
                        });
                    };
                    metrics::record_reconnect("retry");
                    tracing::warn!(attempt = failures, delay = ?delay, error = %e, "KV connection failed, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn shared(&self) -> Result<&ArcSwap<MultiplexedConnection>, KvError> {
        self.connection
            .get_or_try_init(|| async {
                tracing::debug!("Opening KV connection");
                self.connect().await.map(ArcSwap::from_pointee)
            })
            .await
    }

    /// Replace the shared connection unless another caller already did
    /// since `seen` was read.
    async fn reconnect(&self, slot: &ArcSwap<MultiplexedConnection>, seen: u64) -> Result<(), KvError> {
        let _guard = self.reconnecting.lock().await;
        if self.generation.load(Ordering::Acquire) != seen {
            return Ok(());
        }
        let conn = self.connect().await?;
        slot.store(Arc::new(conn));
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T, KvError>
    where
        F: Fn(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let slot = self.shared().await?;
        let seen = self.generation.load(Ordering::Acquire);
        let conn = MultiplexedConnection::clone(&slot.load());

        match op(conn).await {
            Ok(value) => Ok(value),
            Err(e) if is_connection_error(&e) => {
                tracing::warn!(error = %e, "KV connection dropped, reconnecting");
                self.reconnect(slot, seen).await?;
                let conn = MultiplexedConnection::clone(&slot.load());
                Ok(op(conn).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl KvClient for ConnectionKv {
    fn name(&self) -> &'static str {
        "connection"
    }

    async fn get_count(&self, key: &str) -> Result<Option<u64>, KvError> {
        let raw: Option<String> = self
            .run(|mut conn| async move { conn.get(key).await })
            .await?;
        raw.map(|v| parse_count(key, &v)).transpose()
    }

    async fn incr(&self, key: &str) -> Result<u64, KvError> {
        self.run(|mut conn| async move { conn.incr(key, 1u64).await })
            .await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, KvError> {
        self.run(|mut conn| async move { conn.get(key).await }).await
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        self.run(|mut conn| async move { conn.set_ex(key, value, ttl_secs).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.run(|mut conn| async move { conn.del(key).await }).await
    }
}
