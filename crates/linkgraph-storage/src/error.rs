//! Storage error types.

use thiserror::Error;

use crate::records::{EntityKind, RecordId};

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: EntityKind, id: RecordId },

    /// A stored record was converted into the wrong typed record.
    #[error("record kind mismatch: expected {expected}, got {actual}")]
    RecordKindMismatch {
        expected: EntityKind,
        actual: EntityKind,
    },

    /// Invalid input error.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Database connection error.
    #[error("database connection error: {message}")]
    ConnectionError { message: String },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
