//! Chunk store error types.

use p2pstore_storage::DatastoreError;

use crate::ChunkHash;

/// Errors decoding stored bytes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No bytes at all.
    #[error("empty input")]
    Empty,

    /// Leading format-version byte is not one this build understands.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// Bytes left over after the value was decoded.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// Structural decode/encode failure.
    #[error("postcard: {0}")]
    Postcard(#[from] postcard::Error),
}

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum ChunkStoreError {
    /// No record is stored for the hash.
    #[error("chunk not found: {0}")]
    NotFound(ChunkHash),

    /// A zero-length content hash was supplied.
    #[error("empty chunk hash")]
    EmptyHash,

    /// A textual hash was not valid hex.
    #[error("invalid chunk hash: {0}")]
    InvalidHash(#[from] hex::FromHexError),

    /// The stored record for the hash could not be decoded.
    #[error("corrupt chunk record {hash}: {source}")]
    CorruptRecord {
        /// Hash whose record is unreadable.
        hash: ChunkHash,
        /// Underlying decode failure.
        #[source]
        source: CodecError,
    },

    /// The persisted local chunk index could not be decoded.
    #[error("corrupt local chunk index: {0}")]
    IndexCorrupt(#[source] CodecError),

    /// A value could not be serialized for storage.
    #[error("encode error: {0}")]
    Encode(#[source] CodecError),

    /// Backing store failure.
    #[error("datastore error: {0}")]
    Datastore(#[from] DatastoreError),
}
