//! Account read repository.

use async_trait::async_trait;
use fintrack_core::ledger::Account;
use fintrack_shared::types::{AccountId, UserId};

use crate::error::StoreError;

/// Read access to accounts.
///
/// Every lookup is scoped by the owning user; an account owned by someone
/// else is indistinguishable from a missing one.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Fetches one of `user_id`'s accounts.
    async fn get_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError>;

    /// Lists `user_id`'s accounts, newest first.
    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError>;
}
