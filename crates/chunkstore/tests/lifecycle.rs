//! Chunk lifecycle against a durable redb datastore.

use std::time::Duration;

use assert_matches::assert_matches;
use bytes::Bytes;
use p2pstore_chunkstore::{
    AddOutcome, BlockBodies, ChunkHash, ChunkInfo, ChunkLookup, ChunkStore, ChunkStoreConfig,
    ChunkStoreError, InflightSet, ManualClock,
};
use p2pstore_storage_redb::RedbDatastore;
use tempfile::tempdir;

const MILLI: i64 = 1_000_000;

fn open(
    path: &std::path::Path,
    clock: &ManualClock,
) -> ChunkStore<RedbDatastore, ManualClock> {
    ChunkStore::with_parts(
        RedbDatastore::open(path).unwrap(),
        clock.clone(),
        InflightSet::new(),
        ChunkStoreConfig::with_expiry(Duration::from_millis(1000)),
    )
}

fn blockbody_1() -> (ChunkInfo, BlockBodies) {
    let hash: ChunkHash = "0xAB12".parse().unwrap();
    let bodies = vec![Bytes::from_static(b"blockbody-1")].into();
    (ChunkInfo::new(hash, 0, 0), bodies)
}

#[test]
fn fresh_then_expired_then_gone() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(0);
    let store = open(&dir.path().join("chunks.redb"), &clock);
    let (info, bodies) = blockbody_1();

    assert_eq!(store.add(&info, bodies.clone()).unwrap(), AddOutcome::Stored);

    clock.set(500 * MILLI);
    assert_eq!(store.get(&info.hash).unwrap(), ChunkLookup::Fresh(bodies.clone()));

    clock.set(1500 * MILLI);
    assert_eq!(store.get(&info.hash).unwrap(), ChunkLookup::Expired(bodies));

    clock.set(1600 * MILLI);
    assert_matches!(store.get(&info.hash), Err(ChunkStoreError::NotFound(_)));
    assert!(store.local_chunks().unwrap().is_empty());
}

#[test]
fn update_extends_life() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(0);
    let store = open(&dir.path().join("chunks.redb"), &clock);
    let (info, bodies) = blockbody_1();

    store.add(&info, bodies.clone()).unwrap();
    clock.set(900 * MILLI);
    store.update(&info).unwrap();

    clock.set(1500 * MILLI);
    let lookup = store.get(&info.hash).unwrap();
    assert!(!lookup.is_expired());
    assert_eq!(lookup.into_bodies(), bodies);
}

#[test]
fn state_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chunks.redb");
    let clock = ManualClock::new(0);
    let (info, bodies) = blockbody_1();

    {
        let store = open(&path, &clock);
        store.add(&info, bodies.clone()).unwrap();
    }

    let store = open(&path, &clock);
    assert_eq!(store.local_chunks().unwrap(), vec![info.clone()]);
    assert_eq!(store.get(&info.hash).unwrap(), ChunkLookup::Fresh(bodies));

    store.delete(&info.hash).unwrap();
    drop(store);

    let store = open(&path, &clock);
    assert_eq!(store.chunk_count().unwrap(), 0);
    assert_matches!(store.get(&info.hash), Err(ChunkStoreError::NotFound(_)));
}

#[test]
fn only_chunk_and_index_keys_are_written() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(0);
    let store = open(&dir.path().join("chunks.redb"), &clock);

    for n in 0..4u8 {
        let info = ChunkInfo::new(ChunkHash::new(vec![n, 0xee]).unwrap(), 0, 0);
        store.add(&info, BlockBodies::default()).unwrap();
    }

    let chunks = store
        .datastore()
        .keys_with_prefix(&p2pstore_storage::DatastoreKey::new("/chunk"))
        .unwrap();
    assert_eq!(chunks.len(), 4);
    let all = store
        .datastore()
        .keys_with_prefix(&p2pstore_storage::DatastoreKey::new("/"))
        .unwrap();
    assert_eq!(all.len(), 5);
}
