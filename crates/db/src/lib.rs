//! Persistence layer for the ledger.
//!
//! This crate provides:
//! - Read-side repository traits for accounts and transactions
//! - `CommitUnit`, the atomic write boundary, applied by `LedgerStore::commit`
//! - Leases for exclusive recurring-template claims
//! - `InMemoryStore`, the reference implementation
//! - JSON snapshots for loading and saving store contents

pub mod error;
pub mod memory;
pub mod repositories;
pub mod snapshot;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use repositories::{
    AccountRepo, CommitOp, CommitReceipt, CommitUnit, LeaseRepo, LedgerStore, TransactionFilter,
    TransactionRepo,
};
pub use snapshot::{StoreSnapshot, read_snapshot, write_snapshot};
