//! Backend selection.
//!
//! First match wins:
//! 1. networked KV credentials present → `NetworkedKv`
//! 2. development environment → `File`
//! 3. otherwise → `Memory` (degraded when running in production)

use crate::config::StorageEnv;
use crate::storage::BackendKind;

/// Map an environment snapshot to the backend that serves counters.
pub fn select_backend(env: &StorageEnv) -> BackendKind {
    if env.has_kv_connection() {
        BackendKind::NetworkedKv
    } else if env.environment().is_development() {
        BackendKind::File
    } else {
        BackendKind::Memory
    }
}

/// Production counters held only in memory are lost on restart.
pub fn is_degraded(env: &StorageEnv, kind: BackendKind) -> bool {
    kind == BackendKind::Memory && env.environment().is_production()
}
