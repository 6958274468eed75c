//! Chart report aggregation.
//!
//! Pure, read-only aggregation of transactions into daily income/expense
//! buckets over a lookback window.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
