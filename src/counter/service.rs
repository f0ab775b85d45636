//! Counter service: backend dispatch and failure policy.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{Environment, ServiceConfig, StorageEnv};
use crate::counter::{CounterError, Slug};
use crate::observability::metrics;
use crate::storage::kv::build_client;
use crate::storage::{
    is_degraded, select_backend, BackendKind, FileStore, KvError, KvStore, MemoryStore,
};

const OP_GET: &str = "get";
const OP_INCREMENT: &str = "increment";

/// Owns every store and decides, per call, which one serves the request.
#[derive(Debug)]
pub struct CounterService {
    env: StorageEnv,
    kv: Option<KvStore>,
    file: FileStore,
    memory: MemoryStore,
    degraded_reported: AtomicBool,
}

impl CounterService {
    pub fn new(env: StorageEnv, kv: Option<KvStore>, file: FileStore, memory: MemoryStore) -> Self {
        Self {
            env,
            kv,
            file,
            memory,
            degraded_reported: AtomicBool::new(false),
        }
    }

    /// Build the stores described by `config` and `env`.
    ///
    /// The networked client is created here but connects lazily.
    pub fn from_config(config: &ServiceConfig, env: StorageEnv) -> Result<Self, KvError> {
        let kv = match env.kv_connection() {
            Some(connection) => {
                let client = build_client(&connection, &config.kv)?;
                tracing::info!(client = client.name(), "Networked KV client configured");
                Some(KvStore::new(client, config.storage.key_prefix.clone()))
            }
            None => None,
        };
        let file = FileStore::new(&config.storage.file_path);
        Ok(Self::new(env, kv, file, MemoryStore::new()))
    }

    pub fn environment(&self) -> Environment {
        self.env.environment()
    }

    pub fn env(&self) -> &StorageEnv {
        &self.env
    }

    pub fn kv(&self) -> Option<&KvStore> {
        self.kv.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        is_degraded(&self.env, select_backend(&self.env))
    }

    /// Resolve the backend for one operation, surfacing degraded mode.
    pub fn backend_kind(&self) -> BackendKind {
        let kind = select_backend(&self.env);
        if is_degraded(&self.env, kind) {
            metrics::set_degraded(true);
            if !self.degraded_reported.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    backend = %kind,
                    "No networked KV configured in production; view counts are kept in memory and lost on restart"
                );
            }
        }
        kind
    }

    pub async fn get_views(&self, slug: &Slug) -> Result<u64, CounterError> {
        let kind = self.backend_kind();
        let result = match kind {
            BackendKind::NetworkedKv => match self.kv_get(slug).await {
                Ok(views) => Ok(views),
                Err(e) => self.on_kv_failure(OP_GET, slug, e).await,
            },
            BackendKind::File => Ok(self.file_get(slug).await),
            BackendKind::Memory => Ok(self.memory.get(slug.as_str())),
        };
        record(OP_GET, kind, &result);
        result
    }

    pub async fn increment_views(&self, slug: &Slug) -> Result<u64, CounterError> {
        let kind = self.backend_kind();
        let result = match kind {
            BackendKind::NetworkedKv => match self.kv_increment(slug).await {
                Ok(views) => Ok(views),
                Err(e) => self.on_kv_failure(OP_INCREMENT, slug, e).await,
            },
            BackendKind::File => Ok(self.file_increment(slug).await),
            BackendKind::Memory => Ok(self.memory.increment(slug.as_str())),
        };
        record(OP_INCREMENT, kind, &result);
        result
    }

    async fn kv_get(&self, slug: &Slug) -> Result<u64, KvError> {
        match &self.kv {
            Some(kv) => kv.get(slug.as_str()).await,
            None => Err(KvError::NotConfigured),
        }
    }

    async fn kv_increment(&self, slug: &Slug) -> Result<u64, KvError> {
        match &self.kv {
            Some(kv) => kv.increment(slug.as_str()).await,
            None => Err(KvError::NotConfigured),
        }
    }

    /// Development masks KV outages with the file backend; every other
    /// environment reports them.
    async fn on_kv_failure(
        &self,
        op: &'static str,
        slug: &Slug,
        error: KvError,
    ) -> Result<u64, CounterError> {
        if !self.environment().is_development() {
            tracing::error!(op, slug = %slug, error = %error, "Networked KV failed");
            return Err(CounterError::Kv { op, source: error });
        }

        tracing::warn!(op, slug = %slug, error = %error, "Networked KV failed, falling back to file storage");
        metrics::record_fallback(op);
        Ok(match op {
            OP_INCREMENT => self.file_increment(slug).await,
            _ => self.file_get(slug).await,
        })
    }

    async fn file_get(&self, slug: &Slug) -> u64 {
        match self.file.get(slug.as_str()).await {
            Ok(views) => views,
            Err(e) => {
                tracing::warn!(slug = %slug, path = %self.file.path().display(), error = %e, "Reading file storage failed, reporting 0");
                0
            }
        }
    }

    async fn file_increment(&self, slug: &Slug) -> u64 {
        let incremented = self.file.increment(slug.as_str()).await;
        if let Err(e) = incremented.persisted {
            tracing::warn!(slug = %slug, path = %self.file.path().display(), error = %e, "Writing file storage failed, update lost");
        }
        incremented.value
    }
}

fn record(op: &'static str, kind: BackendKind, result: &Result<u64, CounterError>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::record_operation(op, kind.as_str(), outcome);
}
