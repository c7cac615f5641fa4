//! redb-based datastore backend.
//!
//! [`RedbDatastore`] keeps every key of the chunk store in a single redb
//! table. Each `put`/`delete` runs in its own write transaction, which gives
//! the per-key atomicity and durability-on-return the chunk store relies on.

use std::path::Path;

use p2pstore_storage::{Datastore, DatastoreError, DatastoreKey, DatastoreResult};
use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

/// Table definition for the datastore.
/// Key: normalized datastore key
/// Value: raw value bytes
const DATASTORE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("datastore");

/// redb-based datastore.
///
/// Thread-safe for concurrent reads and writes; redb serializes write
/// transactions internally.
pub struct RedbDatastore {
    db: Database,
}

impl RedbDatastore {
    /// Open or create a datastore at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> DatastoreResult<Self> {
        let db = Database::create(path.as_ref()).map_err(backend)?;

        // Ensure the table exists so readers never see a missing table.
        let write_txn = db.begin_write().map_err(backend)?;
        {
            let _ = write_txn.open_table(DATASTORE_TABLE).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        debug!(path = %path.as_ref().display(), "Opened redb datastore");
        Ok(Self { db })
    }

    /// Keys under `prefix`, in order.
    pub fn keys_with_prefix(&self, prefix: &DatastoreKey) -> DatastoreResult<Vec<DatastoreKey>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(DATASTORE_TABLE).map_err(backend)?;

        let mut keys = Vec::new();
        for entry in table.range(prefix.as_str()..).map_err(backend)? {
            let (key, _) = entry.map_err(backend)?;
            let key = key.value();
            if !key.starts_with(prefix.as_str()) {
                break;
            }
            let key = DatastoreKey::new(key);
            if key.is_descendant_of(prefix) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

impl std::fmt::Debug for RedbDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDatastore").finish_non_exhaustive()
    }
}

fn backend(err: impl Into<redb::Error>) -> DatastoreError {
    DatastoreError::Backend(err.into().to_string())
}

impl Datastore for RedbDatastore {
    fn put(&self, key: &DatastoreKey, value: &[u8]) -> DatastoreResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(DATASTORE_TABLE).map_err(backend)?;
            table.insert(key.as_str(), value).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn get(&self, key: &DatastoreKey) -> DatastoreResult<Vec<u8>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(DATASTORE_TABLE).map_err(backend)?;
        match table.get(key.as_str()).map_err(backend)? {
            Some(value) => Ok(value.value().to_vec()),
            None => Err(DatastoreError::NotFound(key.clone())),
        }
    }

    fn delete(&self, key: &DatastoreKey) -> DatastoreResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(DATASTORE_TABLE).map_err(backend)?;
            table.remove(key.as_str()).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn has(&self, key: &DatastoreKey) -> DatastoreResult<bool> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(DATASTORE_TABLE).map_err(backend)?;
        Ok(table.get(key.as_str()).map_err(backend)?.is_some())
    }
}
