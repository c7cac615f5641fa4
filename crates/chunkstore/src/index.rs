//! Local chunk index.
//!
//! One reserved datastore key holds a map from hex chunk hash to
//! [`ChunkInfo`] for every chunk this node stores. It answers "what do I
//! have" without scanning the chunk namespace.
//!
//! Every mutation loads the whole map, changes one entry and writes the
//! whole map back. A single mutex makes that load-mutate-save one critical
//! section, so concurrent mutations for different hashes cannot lose each
//! other's updates.

use std::collections::BTreeMap;

use p2pstore_storage::{Datastore, DatastoreError, DatastoreKey};
use parking_lot::Mutex;
use tracing::trace;

use crate::{
    ChunkHash,
    ChunkInfo,
    ChunkStoreError,
    ChunkStoreResult,
    key::LOCAL_CHUNK_INFO_KEY,
    record::{decode_versioned, encode_versioned},
};

/// Index contents: hex chunk hash to descriptor.
pub type ChunkInfoMap = BTreeMap<String, ChunkInfo>;

/// Result of an index mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexUpdate {
    /// Whether an entry was added or removed.
    pub changed: bool,
    /// Number of entries after the mutation.
    pub len: usize,
}

/// Persisted index of locally stored chunks.
#[derive(Debug)]
pub struct LocalChunkIndex {
    key: DatastoreKey,
    lock: Mutex<()>,
}

impl Default for LocalChunkIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalChunkIndex {
    /// Index stored under the reserved [`LOCAL_CHUNK_INFO_KEY`].
    pub fn new() -> Self {
        Self {
            key: DatastoreKey::new(LOCAL_CHUNK_INFO_KEY),
            lock: Mutex::new(()),
        }
    }

    /// Read the whole index. A missing blob is an empty index.
    pub fn load<D: Datastore>(&self, db: &D) -> ChunkStoreResult<ChunkInfoMap> {
        let _guard = self.lock.lock();
        self.load_unlocked(db)
    }

    /// Overwrite the whole index.
    pub fn save<D: Datastore>(&self, db: &D, map: &ChunkInfoMap) -> ChunkStoreResult<()> {
        let _guard = self.lock.lock();
        self.save_unlocked(db, map)
    }

    /// Insert `info` unless its hash is already indexed.
    ///
    /// An existing descriptor is left untouched.
    pub fn upsert<D: Datastore>(&self, db: &D, info: &ChunkInfo) -> ChunkStoreResult<IndexUpdate> {
        let _guard = self.lock.lock();
        let mut map = self.load_unlocked(db)?;

        let id = info.hash.to_hex();
        if map.contains_key(&id) {
            trace!(hash = %id, "Chunk already indexed");
            return Ok(IndexUpdate {
                changed: false,
                len: map.len(),
            });
        }

        map.insert(id, info.clone());
        self.save_unlocked(db, &map)?;
        Ok(IndexUpdate {
            changed: true,
            len: map.len(),
        })
    }

    /// Drop the entry for `hash`.
    pub fn remove<D: Datastore>(&self, db: &D, hash: &ChunkHash) -> ChunkStoreResult<IndexUpdate> {
        let _guard = self.lock.lock();
        let mut map = self.load_unlocked(db)?;

        if map.remove(&hash.to_hex()).is_none() {
            return Ok(IndexUpdate {
                changed: false,
                len: map.len(),
            });
        }

        self.save_unlocked(db, &map)?;
        Ok(IndexUpdate {
            changed: true,
            len: map.len(),
        })
    }

    /// Descriptor for `hash`, if indexed.
    pub fn get<D: Datastore>(
        &self,
        db: &D,
        hash: &ChunkHash,
    ) -> ChunkStoreResult<Option<ChunkInfo>> {
        Ok(self.load(db)?.remove(&hash.to_hex()))
    }

    /// Whether `hash` is indexed.
    pub fn contains<D: Datastore>(&self, db: &D, hash: &ChunkHash) -> ChunkStoreResult<bool> {
        Ok(self.load(db)?.contains_key(&hash.to_hex()))
    }

    /// All indexed descriptors, ordered by hex hash.
    pub fn list<D: Datastore>(&self, db: &D) -> ChunkStoreResult<Vec<ChunkInfo>> {
        Ok(self.load(db)?.into_values().collect())
    }

    fn load_unlocked<D: Datastore>(&self, db: &D) -> ChunkStoreResult<ChunkInfoMap> {
        match db.get(&self.key) {
            Ok(bytes) => decode_versioned(&bytes).map_err(ChunkStoreError::IndexCorrupt),
            Err(DatastoreError::NotFound(_)) => Ok(ChunkInfoMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save_unlocked<D: Datastore>(&self, db: &D, map: &ChunkInfoMap) -> ChunkStoreResult<()> {
        let bytes = encode_versioned(map).map_err(ChunkStoreError::Encode)?;
        db.put(&self.key, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use p2pstore_storage::MemoryDatastore;

    fn info(hex: &str, start: u64) -> ChunkInfo {
        ChunkInfo::new(hex.parse().unwrap(), start, start + 99)
    }

    #[test]
    fn test_missing_blob_is_empty() {
        let db = MemoryDatastore::new();
        let index = LocalChunkIndex::new();

        assert!(index.load(&db).unwrap().is_empty());
        assert!(db.is_empty());
    }

    #[test]
    fn test_upsert_keeps_first_descriptor() {
        let db = MemoryDatastore::new();
        let index = LocalChunkIndex::new();

        assert_eq!(
            index.upsert(&db, &info("ab12", 0)).unwrap(),
            IndexUpdate {
                changed: true,
                len: 1,
            }
        );
        assert_eq!(
            index.upsert(&db, &info("ab12", 500)).unwrap(),
            IndexUpdate {
                changed: false,
                len: 1,
            }
        );

        let stored = index.get(&db, &"ab12".parse().unwrap()).unwrap().unwrap();
        assert_eq!(stored.start, 0);
        assert_eq!(index.list(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_remove() {
        let db = MemoryDatastore::new();
        let index = LocalChunkIndex::new();
        let hash: ChunkHash = "ab12".parse().unwrap();

        index.upsert(&db, &info("ab12", 0)).unwrap();
        index.upsert(&db, &info("cd34", 100)).unwrap();

        assert_eq!(
            index.remove(&db, &hash).unwrap(),
            IndexUpdate {
                changed: true,
                len: 1,
            }
        );
        assert!(!index.remove(&db, &hash).unwrap().changed);
        assert!(!index.contains(&db, &hash).unwrap());
        assert!(index.contains(&db, &"cd34".parse().unwrap()).unwrap());
    }

    #[test]
    fn test_list_is_ordered_by_hash() {
        let db = MemoryDatastore::new();
        let index = LocalChunkIndex::new();

        for hex in ["ff", "01", "7a"] {
            index.upsert(&db, &info(hex, 0)).unwrap();
        }

        let hashes: Vec<String> = index
            .list(&db)
            .unwrap()
            .iter()
            .map(|i| i.hash.to_hex())
            .collect();
        assert_eq!(hashes, ["01", "7a", "ff"]);
    }

    #[test]
    fn test_corrupt_blob() {
        let db = MemoryDatastore::new();
        let index = LocalChunkIndex::new();
        db.put(
            &DatastoreKey::new(LOCAL_CHUNK_INFO_KEY),
            b"{\"not\":\"postcard\"}",
        )
        .unwrap();

        assert_matches!(index.load(&db), Err(ChunkStoreError::IndexCorrupt(_)));
        assert_matches!(
            index.upsert(&db, &info("ab12", 0)),
            Err(ChunkStoreError::IndexCorrupt(_))
        );
    }

    #[test]
    fn test_concurrent_upserts_are_not_lost() {
        let db = MemoryDatastore::new();
        let index = LocalChunkIndex::new();

        std::thread::scope(|s| {
            for t in 0..8u8 {
                let (db, index) = (&db, &index);
                s.spawn(move || {
                    for i in 0..16u8 {
                        let hash = ChunkHash::new(vec![t, i]).unwrap();
                        index.upsert(db, &ChunkInfo::new(hash, 0, 0)).unwrap();
                    }
                });
            }
        });

        assert_eq!(index.load(&db).unwrap().len(), 8 * 16);
    }
}
