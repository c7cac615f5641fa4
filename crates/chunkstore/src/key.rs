//! Storage keys and DHT routing identifiers derived from chunk hashes.
//!
//! Both derivations start from the same namespaced path,
//! `/chunk/<hex(hash)>`. The routing id hashes the path rather than the raw
//! chunk hash so the namespace prefix separates chunk ids from any other data
//! kind sharing the DHT identifier space.

use core::fmt;
use p2pstore_storage::DatastoreKey;
use sha2::{Digest, Sha256};

use crate::ChunkHash;

/// Namespace for chunk records in the datastore.
pub const CHUNK_NAMESPACE: &str = "chunk";

/// Reserved key holding the local chunk index.
pub const LOCAL_CHUNK_INFO_KEY: &str = "/local-chunk-info";

/// Namespaced path for a chunk: `/chunk/<hex(hash)>`.
pub fn chunk_path(hash: &ChunkHash) -> String {
    format!("/{CHUNK_NAMESPACE}/{}", hash.to_hex())
}

/// Datastore key holding the chunk record.
pub fn chunk_key(hash: &ChunkHash) -> DatastoreKey {
    DatastoreKey::new(chunk_path(hash))
}

/// DHT routing identifier for a chunk: `sha256(chunk_path(hash))`.
pub fn routing_id(hash: &ChunkHash) -> RoutingId {
    RoutingId(Sha256::digest(chunk_path(hash).as_bytes()).into())
}

/// A point in the DHT's 256-bit identifier space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoutingId([u8; 32]);

impl RoutingId {
    /// Raw identifier bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for RoutingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for RoutingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoutingId({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(hex: &str) -> ChunkHash {
        hex.parse().unwrap()
    }

    #[test]
    fn test_chunk_path() {
        assert_eq!(chunk_path(&hash("ab12")), "/chunk/ab12");
        assert_eq!(chunk_key(&hash("ab12")).as_str(), "/chunk/ab12");
    }

    #[test]
    fn test_paths_are_distinct_per_hash() {
        // 0x0a0b vs 0xa0b0 would collide under a non-padded encoding
        assert_ne!(chunk_path(&hash("0a0b")), chunk_path(&hash("a0b0")));
        assert_ne!(chunk_path(&hash("00")), chunk_path(&hash("0000")));
    }

    #[test]
    fn test_index_key_outside_chunk_namespace() {
        let ns = DatastoreKey::new(CHUNK_NAMESPACE);
        assert!(!DatastoreKey::new(LOCAL_CHUNK_INFO_KEY).is_descendant_of(&ns));
        assert!(chunk_key(&hash("ff")).is_descendant_of(&ns));
    }

    #[test]
    fn test_routing_id_hashes_the_path() {
        let h = hash("ab12");
        let expected: [u8; 32] = Sha256::digest(b"/chunk/ab12").into();
        let raw: [u8; 32] = Sha256::digest([0xab_u8, 0x12]).into();

        assert_eq!(routing_id(&h).as_bytes(), &expected);
        assert_ne!(routing_id(&h).as_bytes(), &raw);
        assert_eq!(routing_id(&h), routing_id(&hash("AB12")));
    }
}
