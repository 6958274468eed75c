//! Single-entry income/expense ledger logic.
//!
//! This module implements the pure half of the ledger:
//! - Account and transaction domain types
//! - Input validation and money normalisation
//! - Balance deltas for create/update/delete
//! - Transaction construction and recurring schedule bookkeeping
//! - Invariant checks (one default account, balance reconciliation)
//! - Receipt-hint intake

pub mod balance;
pub mod error;
pub mod invariants;
pub mod receipt;
pub mod transaction;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{BalanceChange, balance_changes};
pub use error::LedgerError;
pub use invariants::{InvariantViolation, Reconciliation, check_default_account};
pub use receipt::ReceiptHint;
pub use types::{
    Account, AccountSummary, AccountType, Transaction, TransactionFields, TransactionStatus,
    TransactionType,
};
pub use validation::{
    parse_amount, parse_date, validate_account_name, validate_adjustment, validate_amount,
    validate_fields, validate_opening_balance,
};
