//! Backing store contract for the p2p chunk store.
//!
//! The chunk store persists everything through a [`Datastore`]: an ordered
//! key-value store with namespaced string keys and byte values. This crate
//! defines the contract and ships an in-memory implementation; durable
//! backends live in sibling crates.

mod error;
mod key;
mod memory;

pub use error::{DatastoreError, DatastoreResult};
pub use key::DatastoreKey;
pub use memory::MemoryDatastore;

/// Ordered key-value backing store.
///
/// # Contract
///
/// - [`put`](Datastore::put) is atomic per key and durable once it returns.
/// - [`get`](Datastore::get) returns [`DatastoreError::NotFound`] for absent keys.
/// - [`delete`](Datastore::delete) is idempotent: deleting an absent key succeeds.
///
/// Implementations must be thread-safe; callers may invoke any operation
/// concurrently for arbitrary keys.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait Datastore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &DatastoreKey, value: &[u8]) -> DatastoreResult<()>;

    /// Read the value stored under `key`.
    fn get(&self, key: &DatastoreKey) -> DatastoreResult<Vec<u8>>;

    /// Remove `key`. Succeeds when the key is already absent.
    fn delete(&self, key: &DatastoreKey) -> DatastoreResult<()>;

    /// Check whether `key` holds a value.
    fn has(&self, key: &DatastoreKey) -> DatastoreResult<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(DatastoreError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
