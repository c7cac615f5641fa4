//! Single-flight guard for chunk writes.
//!
//! Concurrent adds of the same chunk collapse into one write: the first
//! caller acquires the hash and performs the write, later callers see the
//! marker and back off. The marker is released when the owner's
//! [`InflightGuard`] drops, on every exit path.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};

use crate::ChunkHash;

/// Set of chunk hashes with a write in progress.
///
/// Clones share the same set. Each chunk store owns one, injected at
/// construction; there is no process-wide instance.
#[derive(Clone, Debug, Default)]
pub struct InflightSet {
    inner: Arc<DashMap<ChunkHash, ()>>,
}

impl InflightSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `hash` as in flight.
    ///
    /// Test-and-set is a single step under the shard lock. Returns `None`
    /// if another caller already holds the hash.
    pub fn try_acquire(&self, hash: &ChunkHash) -> Option<InflightGuard<'_>> {
        match self.inner.entry(hash.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                entry.insert(());
                Some(InflightGuard {
                    set: self,
                    hash: hash.clone(),
                })
            }
        }
    }

    /// Whether `hash` is currently held.
    pub fn contains(&self, hash: &ChunkHash) -> bool {
        self.inner.contains_key(hash)
    }

    /// Number of hashes currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no hash is held.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Ownership of an in-flight hash. Dropping it releases the hash.
#[derive(Debug)]
#[must_use = "the hash is released as soon as the guard is dropped"]
pub struct InflightGuard<'a> {
    set: &'a InflightSet,
    hash: ChunkHash,
}

impl InflightGuard<'_> {
    /// The held hash.
    pub fn hash(&self) -> &ChunkHash {
        &self.hash
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.set.inner.remove(&self.hash);
    }
}
