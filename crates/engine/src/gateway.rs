//! Timeout-bounded access to the store.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fintrack_core::ledger::{Account, Transaction};
use fintrack_db::{
    AccountRepo, CommitReceipt, CommitUnit, LeaseRepo, LedgerStore, StoreError, TransactionFilter,
    TransactionRepo,
};
use fintrack_shared::types::{AccountId, TransactionId, UserId, WorkerId};

/// Everything the engine needs from a store.
pub trait Backend:
    AccountRepo + TransactionRepo + LeaseRepo + LedgerStore + Send + Sync + 'static
{
}

impl<T> Backend for T where
    T: AccountRepo + TransactionRepo + LeaseRepo + LedgerStore + Send + Sync + 'static
{
}

/// Shared handle to the store that bounds every call by a timeout.
///
/// A call that exceeds the timeout is dropped and reported as
/// [`StoreError::Timeout`]. Dropping an in-flight commit is safe: the store
/// applies a unit entirely or not at all.
pub struct Gateway<S> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S> Clone for Gateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: Backend> Gateway<S> {
    /// Wraps `store` with a per-call `timeout`.
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    /// See [`AccountRepo::get_account`].
    pub async fn get_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        self.bounded(self.store.get_account(user_id, account_id)).await
    }

    /// See [`AccountRepo::list_accounts`].
    pub async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        self.bounded(self.store.list_accounts(user_id)).await
    }

    /// See [`TransactionRepo::get_transaction`].
    pub async fn get_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        self.bounded(self.store.get_transaction(user_id, transaction_id))
            .await
    }

    /// See [`TransactionRepo::list_transactions`].
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.bounded(self.store.list_transactions(user_id, filter))
            .await
    }

    /// See [`TransactionRepo::count_by_account`].
    pub async fn count_by_account(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<AccountId, u64>, StoreError> {
        self.bounded(self.store.count_by_account(user_id)).await
    }

    /// See [`TransactionRepo::list_due`].
    pub async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.bounded(self.store.list_due(now, limit)).await
    }

    /// See [`LeaseRepo::try_acquire`].
    pub async fn try_acquire(
        &self,
        key: TransactionId,
        holder: WorkerId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.bounded(self.store.try_acquire(key, holder, now, ttl))
            .await
    }

    /// See [`LeaseRepo::release`].
    pub async fn release(&self, key: TransactionId, holder: WorkerId) -> Result<(), StoreError> {
        self.bounded(self.store.release(key, holder)).await
    }

    /// See [`LedgerStore::commit`].
    pub async fn commit(&self, unit: CommitUnit) -> Result<CommitReceipt, StoreError> {
        self.bounded(self.store.commit(unit)).await
    }
}
