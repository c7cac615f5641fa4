//! In-memory datastore.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::{Datastore, DatastoreError, DatastoreKey, DatastoreResult};

/// Ordered in-memory datastore.
///
/// Nothing survives the process. Used by tests and by nodes that only need
/// a scratch chunk store.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entries: RwLock<BTreeMap<DatastoreKey, Vec<u8>>>,
}

impl MemoryDatastore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Keys under `prefix`, in order.
    pub fn keys_with_prefix(&self, prefix: &DatastoreKey) -> Vec<DatastoreKey> {
        self.entries
            .read()
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.as_str().starts_with(prefix.as_str()))
            .filter(|key| key.is_descendant_of(prefix))
            .cloned()
            .collect()
    }
}

impl Datastore for MemoryDatastore {
    fn put(&self, key: &DatastoreKey, value: &[u8]) -> DatastoreResult<()> {
        self.entries.write().insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &DatastoreKey) -> DatastoreResult<Vec<u8>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| DatastoreError::NotFound(key.clone()))
    }

    fn delete(&self, key: &DatastoreKey) -> DatastoreResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn has(&self, key: &DatastoreKey) -> DatastoreResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_put_get_overwrite() {
        let store = MemoryDatastore::new();
        let key = DatastoreKey::new("/chunk/01");

        store.put(&key, b"first").unwrap();
        store.put(&key, b"second").unwrap();

        assert_eq!(store.get(&key).unwrap(), b"second".to_vec());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let store = MemoryDatastore::new();
        let key = DatastoreKey::new("/chunk/02");

        assert_matches!(store.get(&key), Err(DatastoreError::NotFound(k)) if k == key);
        assert!(!store.has(&key).unwrap());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryDatastore::new();
        let key = DatastoreKey::new("/chunk/03");

        store.delete(&key).unwrap();
        store.put(&key, b"data").unwrap();
        store.delete(&key).unwrap();
        store.delete(&key).unwrap();

        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_with_prefix() {
        let store = MemoryDatastore::new();
        store.put(&DatastoreKey::new("/chunk/aa"), b"1").unwrap();
        store.put(&DatastoreKey::new("/chunk/bb"), b"2").unwrap();
        store.put(&DatastoreKey::new("/chunkx/cc"), b"3").unwrap();
        store.put(&DatastoreKey::new("/local-chunk-info"), b"4").unwrap();

        let keys = store.keys_with_prefix(&DatastoreKey::new("/chunk"));
        assert_eq!(
            keys,
            vec![DatastoreKey::new("/chunk/aa"), DatastoreKey::new("/chunk/bb")]
        );
    }
}
