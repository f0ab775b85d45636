//! In-process counters, last-resort storage. Lost when the process exits.

use dashmap::DashMap;

/// Concurrent slug → count map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counts: DashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slug: &str) -> u64 {
        self.counts.get(slug).map(|r| *r.value()).unwrap_or(0)
    }

    /// Add one and return the new count. The shard lock is held across the
    /// read and the write, so increments on one slug never interleave.
    pub fn increment(&self, slug: &str) -> u64 {
        let mut entry = self.counts.entry(slug.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Number of slugs with a count.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
