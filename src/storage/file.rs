//! File-backed counters for local development.
//!
//! The whole map lives in one JSON document (`{"slug": count}`). Every write
//! reads the current document, changes one key and renames a freshly
//! written copy over the file, so unlocked readers never see a partial map.
//! Mutations within this process go through a single async mutex; separate
//! processes sharing the file can still overwrite each other.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::storage::StoreError;

type CounterMap = BTreeMap<String, u64>;

/// Result of a file increment. The new count is always reported, even when
/// it could not be written back.
#[derive(Debug)]
pub struct Incremented {
    pub value: u64,
    pub persisted: Result<(), StoreError>,
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<CounterMap, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CounterMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Sibling file the next document is staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }

    /// Replace the document atomically: readers see the old map or the new
    /// one, never a truncated file.
    async fn store(&self, map: &CounterMap) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(map)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, bytes).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Current count for `slug`; a missing file or key reads as 0.
    pub async fn get(&self, slug: &str) -> Result<u64, StoreError> {
        Ok(self.load().await?.get(slug).copied().unwrap_or(0))
    }

    /// Overwrite one key, keeping every other entry.
    pub async fn set(&self, slug: &str, value: u64) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        let mut map = self.load().await?;
        map.insert(slug.to_string(), value);
        self.store(&map).await
    }

    /// Read, add one, write back.
    ///
    /// An unreadable file counts as empty, so the increment reports 1 and
    /// the write is skipped rather than clobbering the damaged file.
    pub async fn increment(&self, slug: &str) -> Incremented {
        let _writer = self.writer.lock().await;
        let mut map = match self.load().await {
            Ok(map) => map,
            Err(e) => {
                return Incremented {
                    value: 1,
                    persisted: Err(e),
                }
            }
        };

        let value = map.get(slug).copied().unwrap_or(0) + 1;
        map.insert(slug.to_string(), value);
        Incremented {
            value,
            persisted: self.store(&map).await,
        }
    }
}
