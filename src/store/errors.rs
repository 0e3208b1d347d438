use thiserror::Error;

/// Errors that can arise while interacting with the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// The backing store is unreachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A caller-supplied key component would collide with the key scheme
    /// (embedded separator, control characters, empty or overlong).
    #[error("invalid key segment: {0:?}")]
    InvalidKey(String),
}
