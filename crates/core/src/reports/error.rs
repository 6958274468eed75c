//! Report error types.

use chrono::NaiveDate;
use fintrack_shared::AppError;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Range selector label is not one of the supported windows.
    #[error("Unknown report range: {0}")]
    UnknownRange(String),

    /// A bucket sum left the representable decimal range.
    #[error("Report sums overflow on {0}")]
    BucketOverflow(NaiveDate),

    /// The report totals left the representable decimal range.
    #[error("Report totals overflow")]
    TotalsOverflow,
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::UnknownRange(_) => Self::Validation(err.to_string()),
            ReportError::BucketOverflow(_) | ReportError::TotalsOverflow => {
                Self::Integrity(err.to_string())
            }
        }
    }
}
