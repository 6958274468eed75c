//! Transaction operations.
//!
//! Every mutation is one commit unit holding the transaction write and the
//! balance compare-and-swaps it implies, so a record and its balance effect
//! always land together or not at all.

use chrono::{DateTime, Utc};
use fintrack_core::ledger::{
    ReceiptHint, Transaction, TransactionFields, TransactionType, balance_changes, validate_fields,
};
use fintrack_db::{CommitUnit, TransactionFilter};
use fintrack_shared::{AppError, AppResult};
use fintrack_shared::types::{AccountId, PageRequest, PageResponse, TransactionId, UserId};

use crate::accounts::AccountStore;
use crate::gateway::{Backend, Gateway};
use crate::retry::RetryPolicy;

/// Transaction operations over a store.
pub struct TransactionLedger<S> {
    gateway: Gateway<S>,
    accounts: AccountStore<S>,
    retry: RetryPolicy,
}

impl<S> Clone for TransactionLedger<S> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            accounts: self.accounts.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<S: Backend> TransactionLedger<S> {
    /// Creates the service.
    pub fn new(gateway: Gateway<S>, accounts: AccountStore<S>, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            accounts,
            retry,
        }
    }

    /// Records a transaction and applies its delta to the account.
    pub async fn create_transaction(
        &self,
        user_id: UserId,
        fields: TransactionFields,
    ) -> AppResult<Transaction> {
        let fields = validate_fields(fields)?;
        let draft = &Transaction::from_fields(user_id, fields, Utc::now());

        let created = self
            .retry
            .run("create_transaction", move || self.try_create(draft))
            .await?;

        tracing::info!(
            user_id = %user_id,
            account_id = %created.account_id,
            transaction_id = %created.id,
            transaction_type = ?created.transaction_type,
            amount = %created.amount,
            status = ?created.status,
            "Transaction created"
        );
        Ok(created)
    }

    async fn try_create(&self, draft: &Transaction) -> AppResult<Transaction> {
        let mut unit = CommitUnit::new();
        self.accounts
            .stage_adjustments(
                &mut unit,
                draft.user_id,
                &balance_changes(None, Some(draft.balance_effect())),
            )
            .await?;
        unit.create_transaction(draft.clone());

        let receipt = self.gateway.commit(unit).await?;
        receipt
            .transaction(draft.id)
            .cloned()
            .ok_or_else(|| missing_from_receipt(draft.id))
    }

    /// Records a one-off transaction from a receipt-scanner hint.
    ///
    /// The hint is untrusted and goes through full validation.
    pub async fn create_from_receipt(
        &self,
        user_id: UserId,
        account_id: AccountId,
        transaction_type: TransactionType,
        hint: ReceiptHint,
        fallback_date: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        let fields = hint.into_fields(account_id, transaction_type, fallback_date)?;
        self.create_transaction(user_id, fields).await
    }

    /// Replaces a transaction's fields and moves its balance effect.
    ///
    /// The old delta is reversed and the new one applied in the same commit,
    /// on one account or across two if the transaction changes account.
    pub async fn update_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
        fields: TransactionFields,
    ) -> AppResult<Transaction> {
        let fields = &validate_fields(fields)?;

        let updated = self
            .retry
            .run("update_transaction", move || {
                self.try_update(user_id, transaction_id, fields)
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            account_id = %updated.account_id,
            transaction_id = %updated.id,
            amount = %updated.amount,
            status = ?updated.status,
            "Transaction updated"
        );
        Ok(updated)
    }

    async fn try_update(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
        fields: &TransactionFields,
    ) -> AppResult<Transaction> {
        let current = self.require_transaction(user_id, transaction_id).await?;
        // Ownership of the target account is checked even when no balance
        // change lands on it.
        self.accounts.get_account(user_id, fields.account_id).await?;

        let updated = current.with_fields(fields.clone(), Utc::now());
        let mut unit = CommitUnit::new();
        self.accounts
            .stage_adjustments(
                &mut unit,
                user_id,
                &balance_changes(Some(current.balance_effect()), Some(updated.balance_effect())),
            )
            .await?;
        unit.update_transaction(updated, current.version);

        let receipt = self.gateway.commit(unit).await?;
        receipt
            .transaction(transaction_id)
            .cloned()
            .ok_or_else(|| missing_from_receipt(transaction_id))
    }

    /// Removes a transaction and reverses its delta.
    pub async fn delete_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> AppResult<()> {
        let removed = self
            .retry
            .run("delete_transaction", move || self.try_delete(user_id, transaction_id))
            .await?;

        tracing::info!(
            user_id = %user_id,
            account_id = %removed.account_id,
            transaction_id = %transaction_id,
            "Transaction deleted"
        );
        Ok(())
    }

    async fn try_delete(&self, user_id: UserId, transaction_id: TransactionId) -> AppResult<Transaction> {
        let current = self.require_transaction(user_id, transaction_id).await?;

        let mut unit = CommitUnit::new();
        self.accounts
            .stage_adjustments(
                &mut unit,
                user_id,
                &balance_changes(Some(current.balance_effect()), None),
            )
            .await?;
        unit.delete_transaction(user_id, transaction_id, current.version);

        self.gateway.commit(unit).await?;
        Ok(current)
    }

    /// Fetches a transaction owned by `user_id`.
    pub async fn get_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> AppResult<Transaction> {
        self.require_transaction(user_id, transaction_id).await
    }

    /// Lists the user's transactions, latest date first, one page at a time.
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<Transaction>> {
        if let Some(account_id) = filter.account_id {
            self.accounts.get_account(user_id, account_id).await?;
        }
        let transactions = self.gateway.list_transactions(user_id, filter).await?;
        Ok(page.paginate(transactions))
    }

    async fn require_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> AppResult<Transaction> {
        self.gateway
            .get_transaction(user_id, transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {transaction_id}")))
    }
}

fn missing_from_receipt(transaction_id: TransactionId) -> AppError {
    AppError::Internal(format!("commit did not return transaction {transaction_id}"))
}
