//! Chunk store metrics.

use metrics::{Counter, Gauge};

/// Chunk store metrics
#[derive(Clone, Debug)]
pub(crate) struct ChunkStoreMetrics {
    /// Chunk records written
    pub(crate) stored_total: Counter,
    /// Adds that found the hash already in flight
    pub(crate) inflight_collapsed_total: Counter,
    /// Reads served fresh
    pub(crate) fresh_reads_total: Counter,
    /// Records evicted because they expired
    pub(crate) expired_total: Counter,
    /// Chunks removed by explicit delete
    pub(crate) deleted_total: Counter,
    /// Entries in the local chunk index
    pub(crate) indexed: Gauge,
}

impl Default for ChunkStoreMetrics {
    fn default() -> Self {
        Self {
            stored_total: metrics::counter!("chunkstore.stored_total"),
            inflight_collapsed_total: metrics::counter!("chunkstore.inflight_collapsed_total"),
            fresh_reads_total: metrics::counter!("chunkstore.fresh_reads_total"),
            expired_total: metrics::counter!("chunkstore.expired_total"),
            deleted_total: metrics::counter!("chunkstore.deleted_total"),
            indexed: metrics::gauge!("chunkstore.indexed"),
        }
    }
}
