//! Counter storage subsystem.
//!
//! # Data Flow
//! ```text
//! StorageEnv snapshot
//!     → selector.rs (pure: credentials + APP_ENV → BackendKind)
//!
//! BackendKind::NetworkedKv → kv/ (REST or connection client, views:<slug>)
//! BackendKind::File        → file.rs (.view-counts.json, whole-map rewrite)
//! BackendKind::Memory      → memory.rs (process lifetime only)
//! ```
//!
//! # Design Decisions
//! - Every backend call returns a `Result`; the counter service owns the
//!   decision to coerce or propagate
//! - Stores are plain owned values, constructed at startup and injected
//! - Absence of a counter reads as 0

pub mod file;
pub mod kv;
pub mod memory;
pub mod selector;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub use file::FileStore;
pub use kv::{KvClient, KvError, KvStore};
pub use memory::MemoryStore;
pub use selector::{is_degraded, select_backend};

/// Storage tier serving a counter operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    NetworkedKv,
    File,
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::NetworkedKv => "networked-kv",
            BackendKind::File => "file",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the local (file) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("counter file is not a valid counter map: {0}")]
    Corrupt(#[from] serde_json::Error),
}
