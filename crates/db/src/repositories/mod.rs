//! Repository abstractions for data access.
//!
//! Reads go through the per-entity repository traits. Writes are staged on a
//! [`CommitUnit`] and applied atomically by [`LedgerStore::commit`], so a
//! transaction record and its balance change always land together.

pub mod account;
pub mod commit;
pub mod lease;
pub mod transaction;

pub use account::AccountRepo;
pub use commit::{CommitOp, CommitReceipt, CommitUnit, LedgerStore};
pub use lease::LeaseRepo;
pub use transaction::{TransactionFilter, TransactionRepo};
