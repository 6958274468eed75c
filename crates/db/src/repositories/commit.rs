//! Atomic commit units.
//!
//! A [`CommitUnit`] is an ordered list of writes, each carrying the state it
//! expects to find. The store checks every expectation and applies every
//! write as one step; if any expectation fails nothing is applied.

use async_trait::async_trait;
use fintrack_core::ledger::{Account, Transaction};
use fintrack_shared::types::{AccountId, TransactionId, UserId};
use rust_decimal::Decimal;

use crate::error::StoreError;

/// A single staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOp {
    /// Insert a new account.
    ///
    /// `expected_default` is the user's default account as last read. When
    /// the new account is default, the previous default is cleared in the
    /// same step.
    CreateAccount {
        /// The account to insert.
        account: Account,
        /// Default account the caller observed, `None` if the user had none.
        expected_default: Option<AccountId>,
    },

    /// Replace an account's balance if its version is unchanged.
    CompareAndSwapBalance {
        /// Account to update.
        account_id: AccountId,
        /// Version the caller read.
        expected_version: i64,
        /// Balance to store.
        new_balance: Decimal,
    },

    /// Make `account_id` the user's only default account.
    SetDefaultExclusive {
        /// Owning user.
        user_id: UserId,
        /// Account to make default.
        account_id: AccountId,
        /// Default account the caller observed.
        expected_default: Option<AccountId>,
    },

    /// Insert a new transaction.
    CreateTransaction {
        /// The transaction to insert.
        transaction: Transaction,
    },

    /// Replace a transaction if its version is unchanged.
    UpdateTransaction {
        /// New state of the transaction.
        transaction: Transaction,
        /// Version the caller read.
        expected_version: i64,
    },

    /// Remove a transaction if its version is unchanged.
    DeleteTransaction {
        /// Owning user.
        user_id: UserId,
        /// Transaction to remove.
        transaction_id: TransactionId,
        /// Version the caller read.
        expected_version: i64,
    },
}

/// Ordered set of writes applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitUnit {
    ops: Vec<CommitOp>,
}

impl CommitUnit {
    /// Creates an empty unit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an account insert.
    pub fn create_account(&mut self, account: Account, expected_default: Option<AccountId>) -> &mut Self {
        self.ops.push(CommitOp::CreateAccount {
            account,
            expected_default,
        });
        self
    }

    /// Stages a balance compare-and-swap.
    pub fn compare_and_swap_balance(
        &mut self,
        account_id: AccountId,
        expected_version: i64,
        new_balance: Decimal,
    ) -> &mut Self {
        self.ops.push(CommitOp::CompareAndSwapBalance {
            account_id,
            expected_version,
            new_balance,
        });
        self
    }

    /// Stages a default-account swap.
    pub fn set_default_exclusive(
        &mut self,
        user_id: UserId,
        account_id: AccountId,
        expected_default: Option<AccountId>,
    ) -> &mut Self {
        self.ops.push(CommitOp::SetDefaultExclusive {
            user_id,
            account_id,
            expected_default,
        });
        self
    }

    /// Stages a transaction insert.
    pub fn create_transaction(&mut self, transaction: Transaction) -> &mut Self {
        self.ops.push(CommitOp::CreateTransaction { transaction });
        self
    }

    /// Stages a versioned transaction replace.
    pub fn update_transaction(&mut self, transaction: Transaction, expected_version: i64) -> &mut Self {
        self.ops.push(CommitOp::UpdateTransaction {
            transaction,
            expected_version,
        });
        self
    }

    /// Stages a versioned transaction delete.
    pub fn delete_transaction(
        &mut self,
        user_id: UserId,
        transaction_id: TransactionId,
        expected_version: i64,
    ) -> &mut Self {
        self.ops.push(CommitOp::DeleteTransaction {
            user_id,
            transaction_id,
            expected_version,
        });
        self
    }

    /// Staged writes, in order.
    #[must_use]
    pub fn ops(&self) -> &[CommitOp] {
        &self.ops
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consumes the unit, yielding its writes.
    #[must_use]
    pub fn into_ops(self) -> Vec<CommitOp> {
        self.ops
    }
}

/// Records as they stand after a successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Accounts written by the unit, in first-touch order.
    pub accounts: Vec<Account>,
    /// Transactions written by the unit, in first-touch order.
    pub transactions: Vec<Transaction>,
}

impl CommitReceipt {
    /// Post-commit state of `account_id`, if the unit wrote it.
    #[must_use]
    pub fn account(&self, account_id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == account_id)
    }

    /// Post-commit state of `transaction_id`, if the unit wrote it.
    #[must_use]
    pub fn transaction(&self, transaction_id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == transaction_id)
    }
}

/// Write side of the persistence collaborator.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Applies every write in `unit`, or none of them.
    ///
    /// Every applied account or transaction write bumps that record's
    /// version by one.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if any staged expectation no longer holds,
    /// `Missing` or `Duplicate` for bad references, and `Unavailable` if
    /// the store cannot be reached.
    async fn commit(&self, unit: CommitUnit) -> Result<CommitReceipt, StoreError>;
}
