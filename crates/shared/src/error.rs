//! Application-wide error types.
//!
//! Every exposed engine operation returns [`AppResult`]. Lower layers
//! (domain validation, report parsing, the store) convert into [`AppError`]
//! so callers only ever see this taxonomy.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input. Nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced account or transaction is absent or not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Concurrent mutation collision that survived every internal retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A detected invariant violation. Never auto-repaired.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The store timed out or could not be reached. Nothing was written.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Unavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Unavailable(_))
    }

    /// Returns true if the error must halt the operation in progress.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Integrity(_) | Self::Internal(_))
    }
}
