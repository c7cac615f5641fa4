//! Chunk record codec.
//!
//! Records are stored as a format-version byte followed by the postcard
//! encoding of [`ChunkRecord`]. The payload is a tagged union
//! ([`StoredData`]) so further data kinds can share the chunk namespace
//! without runtime type inspection.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{BlockBodies, CodecError};

/// Current on-disk format version for records and the local index.
pub const FORMAT_VERSION: u8 = 1;

/// Payload kinds that can be stored under a chunk key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredData {
    /// Block bodies of a blockchain chunk.
    BlockBodies(BlockBodies),
}

/// Unit of durable chunk storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Last freshness time, unix nanoseconds.
    pub stored_at: i64,
    /// The stored payload.
    pub data: StoredData,
}

impl ChunkRecord {
    /// Record of block bodies stored at `stored_at`.
    pub fn block_bodies(stored_at: i64, bodies: BlockBodies) -> Self {
        Self {
            stored_at,
            data: StoredData::BlockBodies(bodies),
        }
    }

    /// Take the block bodies out of the record.
    pub fn into_block_bodies(self) -> BlockBodies {
        match self.data {
            StoredData::BlockBodies(bodies) => bodies,
        }
    }
}

/// Encode a record for storage.
pub fn encode(record: &ChunkRecord) -> Result<Vec<u8>, CodecError> {
    encode_versioned(record)
}

/// Decode a stored record.
pub fn decode(bytes: &[u8]) -> Result<ChunkRecord, CodecError> {
    decode_versioned(bytes)
}

pub(crate) fn encode_versioned<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let body = postcard::to_allocvec(value)?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

pub(crate) fn decode_versioned<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let (&version, body) = bytes.split_first().ok_or(CodecError::Empty)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let (value, rest) = postcard::take_from_bytes(body)?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes(rest.len()));
    }
    Ok(value)
}
