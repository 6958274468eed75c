//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{MAX_AMOUNT, MONEY_SCALE, normalize_money};
pub use pagination::{PageMeta, PageRequest, PageResponse};
