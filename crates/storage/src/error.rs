use crate::DatastoreKey;

/// Backing store error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DatastoreError {
    /// No value is stored under the key.
    #[error("key not found: {0}")]
    NotFound(DatastoreKey),

    /// The key is not a valid namespaced path.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The rejected key text.
        key: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Failure reported by the underlying storage engine.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result type for backing store operations.
pub type DatastoreResult<T> = Result<T, DatastoreError>;
