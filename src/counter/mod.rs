//! View counter orchestration.
//!
//! # Data Flow
//! ```text
//! get_views / increment_views(slug)
//!     → storage::select_backend (per call, from the injected StorageEnv)
//!     → dispatch to KV / file / memory
//!     → networked KV failure:
//!         development → file backend (logged, counted)
//!         otherwise   → CounterError to the caller
//!     → file failures: reads become 0, lost writes are logged
//! ```

pub mod service;

use std::fmt;
use thiserror::Error;

use crate::storage::KvError;

pub use service::CounterService;

/// Opaque, non-empty counter identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid slug")]
pub struct InvalidSlug;

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, InvalidSlug> {
        if raw.is_empty() {
            Err(InvalidSlug)
        } else {
            Ok(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Counter operation failures that reach the caller.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("networked KV backend failed to {op} views: {source}")]
    Kv {
        op: &'static str,
        #[source]
        source: KvError,
    },
}
