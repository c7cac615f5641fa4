//! Chunk store engine.
//!
//! [`ChunkStore`] composes the datastore, the single-flight guard, the
//! record codec and the local chunk index into the four chunk operations:
//! add, update, get and delete.
//!
//! # Lifecycle
//!
//! ```text
//! Absent ──add──▶ Stored (fresh) ──time──▶ Stored (stale) ──get / sweep──▶ Absent
//!                     ▲    │
//!                     └────┘ update
//! ```
//!
//! Staleness is only evaluated on read: [`ChunkStore::get`] evicts an
//! expired record and still hands its payload back once, flagged
//! [`ChunkLookup::Expired`].
//!
//! # Crash windows
//!
//! Add writes the record before indexing it, and delete unindexes before
//! removing the record. A failure between the two steps therefore leaves a
//! record without an index entry, never an index entry without a record.
//! [`ChunkStore::update`] re-indexes a record that lost its entry, and
//! [`ChunkStore::sweep_expired`] drops entries whose record is gone.

use p2pstore_storage::{Datastore, DatastoreError};
use tracing::{debug, error, trace, warn};

use crate::{
    BlockBodies,
    ChunkHash,
    ChunkInfo,
    ChunkStoreConfig,
    ChunkStoreError,
    ChunkStoreResult,
    Clock,
    InflightSet,
    LocalChunkIndex,
    SystemClock,
    clock::duration_nanos,
    key::chunk_key,
    metrics::ChunkStoreMetrics,
    record::{self, ChunkRecord},
};

/// Outcome of [`ChunkStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// This call wrote the record.
    Stored,
    /// Another call is already writing this chunk; nothing was written here.
    ///
    /// The write is owned by that call and may not be visible yet.
    InFlight,
}

/// Outcome of a successful [`ChunkStore::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkLookup {
    /// Record is within the expiry threshold.
    Fresh(BlockBodies),
    /// Record was older than the expiry threshold and has been evicted.
    ///
    /// The stale payload is returned this once; a later get finds nothing.
    Expired(BlockBodies),
}

impl ChunkLookup {
    /// Whether the record had expired.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired(_))
    }

    /// The payload, fresh or stale.
    pub fn into_bodies(self) -> BlockBodies {
        match self {
            Self::Fresh(bodies) | Self::Expired(bodies) => bodies,
        }
    }
}

/// Result of one [`ChunkStore::sweep_expired`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Index entries examined.
    pub scanned: usize,
    /// Expired chunks evicted.
    pub expired: usize,
    /// Index entries dropped because their record was missing.
    pub dangling: usize,
    /// Records left in place because they could not be decoded.
    pub corrupt: usize,
}

/// Content-addressed chunk store with TTL expiry.
///
/// Safe to share across threads. Concurrent adds of one hash are collapsed
/// by the single-flight guard; index mutations are serialized by the index.
pub struct ChunkStore<D, C = SystemClock> {
    db: D,
    clock: C,
    config: ChunkStoreConfig,
    inflight: InflightSet,
    index: LocalChunkIndex,
    metrics: ChunkStoreMetrics,
}

impl<D: Datastore> ChunkStore<D> {
    /// Create a store on `db` using the wall clock and a private in-flight set.
    pub fn new(db: D, config: ChunkStoreConfig) -> Self {
        Self::with_parts(db, SystemClock, InflightSet::new(), config)
    }
}

impl<D: Datastore, C: Clock> ChunkStore<D, C> {
    /// Create a store from explicit parts.
    pub fn with_parts(db: D, clock: C, inflight: InflightSet, config: ChunkStoreConfig) -> Self {
        Self {
            db,
            clock,
            config,
            inflight,
            index: LocalChunkIndex::new(),
            metrics: ChunkStoreMetrics::default(),
        }
    }

    /// The backing datastore.
    pub fn datastore(&self) -> &D {
        &self.db
    }

    /// The store configuration.
    pub fn config(&self) -> &ChunkStoreConfig {
        &self.config
    }

    /// The local chunk index.
    pub fn index(&self) -> &LocalChunkIndex {
        &self.index
    }

    /// Store a chunk and index it.
    ///
    /// If another add of the same hash is in progress this returns
    /// [`AddOutcome::InFlight`] without writing: the hash is derived from
    /// the content, so that call is writing the same payload.
    ///
    /// The record is written before the index entry. If indexing fails
    /// the record stays stored but unindexed and the error is returned.
    pub fn add(&self, info: &ChunkInfo, bodies: BlockBodies) -> ChunkStoreResult<AddOutcome> {
        let hash = &info.hash;
        let Some(_guard) = self.inflight.try_acquire(hash) else {
            trace!(%hash, "Chunk write already in flight");
            self.metrics.inflight_collapsed_total.increment(1);
            return Ok(AddOutcome::InFlight);
        };

        let record = ChunkRecord::block_bodies(self.clock.now_nanos(), bodies);
        let bytes = record::encode(&record).map_err(ChunkStoreError::Encode)?;
        self.db.put(&chunk_key(hash), &bytes)?;
        self.metrics.stored_total.increment(1);

        let update = self.index.upsert(&self.db, info)?;
        self.metrics.indexed.set(update.len as f64);

        debug!(%hash, stored_at = record.stored_at, size = bytes.len(), "Stored chunk");
        Ok(AddOutcome::Stored)
    }

    /// Refresh a stored chunk's freshness time, keeping its payload.
    ///
    /// Fails with [`ChunkStoreError::NotFound`] if no record exists.
    pub fn update(&self, info: &ChunkInfo) -> ChunkStoreResult<AddOutcome> {
        let record = self.read_record(&info.hash)?;
        self.add(info, record.into_block_bodies())
    }

    /// Read a chunk.
    ///
    /// A record older than the expiry threshold is evicted and returned as
    /// [`ChunkLookup::Expired`]. Eviction failures are logged and do not
    /// fail the read.
    pub fn get(&self, hash: &ChunkHash) -> ChunkStoreResult<ChunkLookup> {
        let record = self.read_record(hash)?;
        let stored_at = record.stored_at;
        let bodies = record.into_block_bodies();

        if !self.is_expired(stored_at) {
            self.metrics.fresh_reads_total.increment(1);
            return Ok(ChunkLookup::Fresh(bodies));
        }

        debug!(%hash, stored_at, "Chunk expired, evicting");
        match self.remove_chunk(hash) {
            Ok(_) => self.metrics.expired_total.increment(1),
            Err(err) => error!(%hash, %err, "Failed to evict expired chunk"),
        }
        Ok(ChunkLookup::Expired(bodies))
    }

    /// Remove a chunk: index entry first, then the record.
    ///
    /// If unindexing fails the record is left untouched. Fails with
    /// [`ChunkStoreError::NotFound`] when neither exists.
    pub fn delete(&self, hash: &ChunkHash) -> ChunkStoreResult<()> {
        if !self.remove_chunk(hash)? {
            return Err(ChunkStoreError::NotFound(hash.clone()));
        }
        self.metrics.deleted_total.increment(1);
        debug!(%hash, "Deleted chunk");
        Ok(())
    }

    /// Whether the local index lists `hash`.
    pub fn has_chunk(&self, hash: &ChunkHash) -> ChunkStoreResult<bool> {
        self.index.contains(&self.db, hash)
    }

    /// Descriptors of every indexed chunk, ordered by hash.
    pub fn local_chunks(&self) -> ChunkStoreResult<Vec<ChunkInfo>> {
        let chunks = self.index.list(&self.db)?;
        self.metrics.indexed.set(chunks.len() as f64);
        Ok(chunks)
    }

    /// Number of indexed chunks.
    pub fn chunk_count(&self) -> ChunkStoreResult<usize> {
        let count = self.index.load(&self.db)?.len();
        self.metrics.indexed.set(count as f64);
        Ok(count)
    }

    /// Evict every expired chunk listed in the index.
    ///
    /// Index entries without a record are dropped. Undecodable records are
    /// logged and left in place.
    pub fn sweep_expired(&self) -> ChunkStoreResult<SweepReport> {
        let mut report = SweepReport::default();

        for info in self.index.list(&self.db)? {
            report.scanned += 1;
            let hash = &info.hash;

            match self.read_record(hash) {
                Ok(record) if self.is_expired(record.stored_at) => {
                    self.remove_chunk(hash)?;
                    self.metrics.expired_total.increment(1);
                    report.expired += 1;
                }
                Ok(_) => {}
                Err(ChunkStoreError::NotFound(_)) => {
                    warn!(%hash, "Dropping index entry without record");
                    let update = self.index.remove(&self.db, hash)?;
                    self.metrics.indexed.set(update.len as f64);
                    report.dangling += 1;
                }
                Err(err @ ChunkStoreError::CorruptRecord { .. }) => {
                    error!(%hash, %err, "Skipping undecodable chunk record");
                    report.corrupt += 1;
                }
                Err(err) => return Err(err),
            }
        }

        debug!(?report, "Expiry sweep complete");
        Ok(report)
    }

    fn read_record(&self, hash: &ChunkHash) -> ChunkStoreResult<ChunkRecord> {
        let bytes = match self.db.get(&chunk_key(hash)) {
            Ok(bytes) => bytes,
            Err(DatastoreError::NotFound(_)) => {
                return Err(ChunkStoreError::NotFound(hash.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        record::decode(&bytes).map_err(|source| ChunkStoreError::CorruptRecord {
            hash: hash.clone(),
            source,
        })
    }

    fn is_expired(&self, stored_at: i64) -> bool {
        let age = self.clock.now_nanos().saturating_sub(stored_at);
        age > duration_nanos(self.config.expiry)
    }

    /// Unindex then delete the record. Returns whether either existed.
    fn remove_chunk(&self, hash: &ChunkHash) -> ChunkStoreResult<bool> {
        let key = chunk_key(hash);

        let update = self.index.remove(&self.db, hash)?;
        self.metrics.indexed.set(update.len as f64);

        let stored = self.db.has(&key)?;
        self.db.delete(&key)?;
        Ok(update.changed || stored)
    }
}

impl<D, C> std::fmt::Debug for ChunkStore<D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("config", &self.config)
            .field("inflight", &self.inflight.len())
            .finish_non_exhaustive()
    }
}
