//! Chunk identity and payload types.

use bytes::Bytes;
use core::{fmt, str::FromStr};
use serde::{Deserialize, Serialize};

use crate::ChunkStoreError;

/// Content hash identifying a chunk.
///
/// Never empty: every constructor rejects a zero-length hash, so key and
/// routing-id derivation cannot be handed an invalid input.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Bytes", into = "Bytes")]
pub struct ChunkHash(Bytes);

impl ChunkHash {
    /// Wrap a content hash.
    pub fn new(hash: impl Into<Bytes>) -> Result<Self, ChunkStoreError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(ChunkStoreError::EmptyHash);
        }
        Ok(Self(hash))
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex form, as used in storage keys and the local index.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for ChunkHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({})", self.to_hex())
    }
}

impl FromStr for ChunkHash {
    type Err = ChunkStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        Self::new(hex::decode(s)?)
    }
}

impl TryFrom<Bytes> for ChunkHash {
    type Error = ChunkStoreError;

    fn try_from(value: Bytes) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&[u8]> for ChunkHash {
    type Error = ChunkStoreError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::new(Bytes::copy_from_slice(value))
    }
}

impl From<ChunkHash> for Bytes {
    fn from(hash: ChunkHash) -> Self {
        hash.0
    }
}

/// Descriptor of a locally held chunk, kept in the local chunk index.
///
/// `start` and `end` are the inclusive block heights the chunk covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    /// Content hash of the chunk.
    pub hash: ChunkHash,
    /// First block height in the chunk.
    pub start: u64,
    /// Last block height in the chunk.
    pub end: u64,
}

impl ChunkInfo {
    /// Create a descriptor.
    pub fn new(hash: ChunkHash, start: u64, end: u64) -> Self {
        Self { hash, start, end }
    }
}

/// Chunk payload: an ordered run of opaque block bodies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBodies(pub Vec<Bytes>);

impl BlockBodies {
    /// Number of block bodies.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload holds no bodies.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the bodies in block order.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.0.iter()
    }

    /// Total payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.0.iter().map(Bytes::len).sum()
    }
}

impl From<Vec<Bytes>> for BlockBodies {
    fn from(bodies: Vec<Bytes>) -> Self {
        Self(bodies)
    }
}

impl FromIterator<Bytes> for BlockBodies {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_empty_hash_rejected() {
        assert_matches!(
            ChunkHash::new(Bytes::new()),
            Err(ChunkStoreError::EmptyHash)
        );
        assert_matches!("".parse::<ChunkHash>(), Err(ChunkStoreError::EmptyHash));
        assert_matches!("0x".parse::<ChunkHash>(), Err(ChunkStoreError::EmptyHash));
    }

    #[test]
    fn test_hex_parse_and_display() {
        let hash: ChunkHash = "0xAB12".parse().unwrap();
        assert_eq!(hash.as_bytes(), &[0xab, 0x12]);
        assert_eq!(hash.to_string(), "ab12");
        assert_eq!(format!("{hash:?}"), "ChunkHash(ab12)");

        assert_matches!(
            "zz".parse::<ChunkHash>(),
            Err(ChunkStoreError::InvalidHash(_))
        );
    }

    #[test]
    fn test_block_bodies_sizes() {
        let bodies: BlockBodies = [Bytes::from_static(b"abc"), Bytes::from_static(b"de")]
            .into_iter()
            .collect();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies.byte_len(), 5);
    }
}
