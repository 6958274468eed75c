//! Transaction read repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fintrack_core::ledger::{Transaction, TransactionStatus, TransactionType};
use fintrack_shared::types::{AccountId, TransactionId, UserId};

use crate::error::StoreError;

/// Filter for listing a user's transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only transactions recorded against this account.
    pub account_id: Option<AccountId>,
    /// Only income or only expense.
    pub transaction_type: Option<TransactionType>,
    /// Only transactions in this status.
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    /// Filter for a single account.
    #[must_use]
    pub fn for_account(account_id: AccountId) -> Self {
        Self {
            account_id: Some(account_id),
            ..Self::default()
        }
    }

    /// Returns true if `tx` passes the filter.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.account_id.is_none_or(|id| tx.account_id == id)
            && self.transaction_type.is_none_or(|ty| tx.transaction_type == ty)
            && self.status.is_none_or(|status| tx.status == status)
    }
}

/// Read access to transactions.
#[async_trait]
pub trait TransactionRepo: Send + Sync {
    /// Fetches one of `user_id`'s transactions.
    async fn get_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Lists `user_id`'s transactions matching `filter`, latest date first.
    async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Counts `user_id`'s transactions per account.
    async fn count_by_account(&self, user_id: UserId)
    -> Result<HashMap<AccountId, u64>, StoreError>;

    /// Lists scheduled templates of every user due at `now`, oldest due first.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, StoreError>;
}
