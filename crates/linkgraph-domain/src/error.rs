//! Domain error types for loading and mutating the social graph.

use std::sync::Arc;

use linkgraph_storage::{RecordId, StorageError};
use thiserror::Error;

/// Domain-specific errors.
///
/// `Clone` because one failed batch fetch is delivered to every caller that
/// contributed a key to it. Storage errors are shared through `Arc`.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// The storage facade failed a fetch or write.
    #[error("storage failure: {0}")]
    StorageFailure(#[source] Arc<StorageError>),

    /// A connection between the two users already exists, in either orientation.
    #[error("users {user1_id} and {user2_id} are already connected")]
    DuplicateRelationship {
        user1_id: RecordId,
        user2_id: RecordId,
    },

    /// Invalid input to a mutation.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A batch function returned a different number of values than keys.
    #[error("loader '{loader}' returned {actual} values for {expected} keys")]
    BatchLengthMismatch {
        loader: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The loader was dropped before the key was dispatched.
    #[error("load from '{loader}' was cancelled before dispatch")]
    LoadCancelled { loader: &'static str },
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        DomainError::StorageFailure(Arc::new(err))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
