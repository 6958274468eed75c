//! Recurring transaction scheduling.
//!
//! Pure date arithmetic for recurring templates:
//! - Next-occurrence computation with month-end clamping
//! - Catch-up planning for templates that fell behind

pub mod interval;
pub mod scheduler;

#[cfg(test)]
mod scheduler_props;

pub use interval::{ParseIntervalError, RecurringInterval};
pub use scheduler::{CatchUpPlan, RecurringScheduler};
