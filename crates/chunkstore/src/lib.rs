//! Local persistence for p2p-distributed blockchain chunks.
//!
//! This crate provides the chunk store a DHT node uses for the block data it
//! is responsible for:
//! - [`ChunkStore`] - add/update/get/delete with TTL expiry and lazy eviction
//! - [`LocalChunkIndex`] - persisted list of locally held chunks
//! - [`InflightSet`] - single-flight guard collapsing concurrent writes
//! - [`record`] - versioned chunk record codec
//! - [`key`] - storage keys and DHT routing ids derived from chunk hashes
//!
//! # Architecture
//!
//! ```text
//! ChunkStore
//! ├── db: Datastore (redb, memory, ...)
//! ├── inflight: InflightSet (hash -> writer marker)
//! ├── index: LocalChunkIndex ("/local-chunk-info")
//! └── clock: Clock (record freshness)
//!
//! "/chunk/<hex>"       -> ChunkRecord { stored_at, data }
//! "/local-chunk-info"  -> { hex -> ChunkInfo }
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use p2pstore_chunkstore::{ChunkStore, ChunkStoreConfig, ChunkLookup};
//! use p2pstore_storage_redb::RedbDatastore;
//!
//! let db = RedbDatastore::open("./chunks.redb")?;
//! let store = ChunkStore::new(db, ChunkStoreConfig::default());
//!
//! store.add(&info, bodies)?;
//! match store.get(&info.hash)? {
//!     ChunkLookup::Fresh(bodies) => serve(bodies),
//!     ChunkLookup::Expired(_) => {} // evicted, fetch from peers instead
//! }
//! ```

mod chunk;
mod clock;
mod config;
mod error;
mod index;
mod inflight;
pub mod key;
mod metrics;
pub mod record;
mod store;

pub use chunk::{BlockBodies, ChunkHash, ChunkInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ALPHA_VALUE, BACKUP, ChunkStoreArgs, ChunkStoreConfig, DEFAULT_EXPIRY, RoutingParams,
};
pub use error::{ChunkStoreError, CodecError};
pub use index::{ChunkInfoMap, IndexUpdate, LocalChunkIndex};
pub use inflight::{InflightGuard, InflightSet};
pub use key::{
    CHUNK_NAMESPACE, LOCAL_CHUNK_INFO_KEY, RoutingId, chunk_key, chunk_path, routing_id,
};
pub use record::{ChunkRecord, StoredData};
pub use store::{AddOutcome, ChunkLookup, ChunkStore, SweepReport};

/// Result type for chunk store operations.
pub type ChunkStoreResult<T> = Result<T, ChunkStoreError>;
