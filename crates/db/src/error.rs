//! Store error types.

use std::time::Duration;

use fintrack_shared::AppError;
use thiserror::Error;

/// Errors returned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An expectation staged in a commit unit no longer holds.
    #[error("Commit conflict: {0}")]
    Conflict(String),

    /// A record with the same identifier already exists.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// A record the commit unit refers to does not exist.
    #[error("Missing record: {0}")]
    Missing(String),

    /// The store did not answer in time.
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A snapshot file could not be read or written.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl StoreError {
    /// Returns true if re-reading and retrying may succeed.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Missing(msg) => Self::NotFound(msg),
            StoreError::Duplicate(msg) => Self::Internal(format!("Duplicate record: {msg}")),
            StoreError::Snapshot(msg) => Self::Internal(format!("Snapshot error: {msg}")),
            StoreError::Timeout(_) | StoreError::Unavailable(_) => Self::Unavailable(err.to_string()),
        }
    }
}
