//! Invariant checks over stored ledger state.
//!
//! These never repair anything. A failed check is reported to the caller,
//! which treats it as fatal and leaves reconciliation to a human.

use fintrack_shared::AppError;
use fintrack_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Account, Transaction};

/// A violated ledger invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A user with accounts has no default account.
    #[error("User {0} has accounts but no default account")]
    NoDefaultAccount(UserId),

    /// A user has more than one default account.
    #[error("User {user_id} has {count} default accounts")]
    MultipleDefaultAccounts {
        /// The affected user.
        user_id: UserId,
        /// Number of accounts flagged default.
        count: usize,
    },

    /// Stored balance disagrees with the transaction history.
    #[error(
        "Account {account_id} balance {recorded} does not reconcile with history (expected {expected})"
    )]
    BalanceMismatch {
        /// The affected account.
        account_id: AccountId,
        /// Balance held by the store.
        recorded: Decimal,
        /// Opening balance plus the sum of transaction deltas.
        expected: Decimal,
    },

    /// Replaying the history leaves the representable decimal range.
    #[error("Account {0} history does not fit in a balance")]
    HistoryOverflow(AccountId),
}

impl From<InvariantViolation> for AppError {
    fn from(err: InvariantViolation) -> Self {
        Self::Integrity(err.to_string())
    }
}

/// Checks the one-default-per-user rule over all of a user's accounts.
///
/// Returns the default account id, or `None` when the user has no accounts.
///
/// # Errors
///
/// Returns a violation when a user with accounts has zero or several defaults.
pub fn check_default_account(
    user_id: UserId,
    accounts: &[Account],
) -> Result<Option<AccountId>, InvariantViolation> {
    let defaults: Vec<AccountId> = accounts
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect();

    match (accounts.is_empty(), defaults.as_slice()) {
        (true, []) => Ok(None),
        (false, [only]) => Ok(Some(*only)),
        (false, []) => Err(InvariantViolation::NoDefaultAccount(user_id)),
        (_, many) => Err(InvariantViolation::MultipleDefaultAccounts {
            user_id,
            count: many.len(),
        }),
    }
}

/// Result of replaying an account's transactions against its balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// The reconciled account.
    pub account_id: AccountId,
    /// Balance the account was opened with.
    pub opening_balance: Decimal,
    /// Balance held by the store.
    pub recorded_balance: Decimal,
    /// Opening balance plus the sum of transaction deltas.
    pub expected_balance: Decimal,
    /// Number of transactions replayed.
    pub transaction_count: usize,
}

impl Reconciliation {
    /// Replays `transactions` (those recorded against `account`).
    ///
    /// # Errors
    ///
    /// Returns `HistoryOverflow` if the replayed balance leaves the
    /// representable range.
    pub fn compute(
        account: &Account,
        transactions: &[Transaction],
    ) -> Result<Self, InvariantViolation> {
        let mut expected = account.opening_balance;
        let mut count = 0;
        for tx in transactions.iter().filter(|t| t.account_id == account.id) {
            expected = expected
                .checked_add(tx.signed_delta())
                .ok_or(InvariantViolation::HistoryOverflow(account.id))?;
            count += 1;
        }

        Ok(Self {
            account_id: account.id,
            opening_balance: account.opening_balance,
            recorded_balance: account.balance,
            expected_balance: expected,
            transaction_count: count,
        })
    }

    /// Returns true if the recorded balance matches the history.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.recorded_balance == self.expected_balance
    }

    /// Converts an inconsistent result into a violation.
    ///
    /// # Errors
    ///
    /// Returns `BalanceMismatch` when the balances disagree.
    pub fn ensure_consistent(self) -> Result<Self, InvariantViolation> {
        if self.is_consistent() {
            Ok(self)
        } else {
            Err(InvariantViolation::BalanceMismatch {
                account_id: self.account_id,
                recorded: self.recorded_balance,
                expected: self.expected_balance,
            })
        }
    }
}
