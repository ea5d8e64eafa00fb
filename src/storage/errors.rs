//! Storage layer error types
//!
//! All errors raised by row indexes and tables are defined here.

use thiserror::Error;

use crate::storage::types::Key;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// the key is out of range or its slot is already free
    #[error("invalid key: {0}")]
    InvalidKey(Key),

    /// the row does not have one value per column
    #[error("row has {actual} values, table has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    /// a value's tag differs from its column's declared kind
    #[error("type mismatch in column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// the table was built without any index to hold rows
    #[error("table has no backing index")]
    NoBackingIndex,

    /// a secondary index rejected a row the primary index already accepted.
    /// Earlier insertions are left in place.
    #[error("secondary index {index} failed for row {key}: {source}")]
    SecondaryIndex {
        index: usize,
        key: Key,
        #[source]
        source: Box<StorageError>,
    },
}

impl StorageError {
    /// check if this error left the table's indexes out of sync
    pub fn is_partial_write(&self) -> bool {
        matches!(self, StorageError::SecondaryIndex { .. })
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
