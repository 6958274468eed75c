//! Account operations.
//!
//! `AccountStore` is the only code that writes `Account.balance` or
//! `Account.is_default`. Ledger mutations reach balances through
//! [`AccountStore::stage_adjustments`], which stages compare-and-swap writes
//! into the caller's commit unit.

use chrono::Utc;
use fintrack_core::ledger::{
    Account, AccountSummary, AccountType, BalanceChange, LedgerError, Reconciliation,
    check_default_account, validate_account_name, validate_adjustment, validate_opening_balance,
};
use fintrack_db::{CommitUnit, TransactionFilter};
use fintrack_shared::{AppError, AppResult};
use fintrack_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::gateway::{Backend, Gateway};
use crate::retry::RetryPolicy;

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Opening balance, non-negative.
    pub initial_balance: Decimal,
    /// Whether the caller wants this to become the default account.
    pub is_default: bool,
}

/// Account operations over a store.
pub struct AccountStore<S> {
    gateway: Gateway<S>,
    retry: RetryPolicy,
}

impl<S> Clone for AccountStore<S> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<S: Backend> AccountStore<S> {
    /// Creates the service.
    pub fn new(gateway: Gateway<S>, retry: RetryPolicy) -> Self {
        Self { gateway, retry }
    }

    /// Creates an account.
    ///
    /// A user's first account is always made default. A later account made
    /// default takes the flag over from the previous default in the same
    /// commit.
    pub async fn create_account(&self, user_id: UserId, input: NewAccount) -> AppResult<Account> {
        let name = validate_account_name(&input.name)?;
        let opening = validate_opening_balance(input.initial_balance)?;
        let id = AccountId::new();
        let draft = &NewAccount {
            name,
            initial_balance: opening,
            ..input
        };

        let account = self
            .retry
            .run("create_account", move || self.try_create_account(user_id, id, draft))
            .await?;

        tracing::info!(
            user_id = %user_id,
            account_id = %account.id,
            is_default = account.is_default,
            "Account created"
        );
        Ok(account)
    }

    async fn try_create_account(
        &self,
        user_id: UserId,
        id: AccountId,
        draft: &NewAccount,
    ) -> AppResult<Account> {
        let existing = self.gateway.list_accounts(user_id).await?;
        let current_default = checked_default(user_id, &existing)?;

        let account = Account {
            id,
            user_id,
            name: draft.name.clone(),
            account_type: draft.account_type,
            balance: draft.initial_balance,
            opening_balance: draft.initial_balance,
            is_default: existing.is_empty() || draft.is_default,
            created_at: Utc::now(),
            version: 1,
        };

        let mut unit = CommitUnit::new();
        unit.create_account(account, current_default);
        let receipt = self.gateway.commit(unit).await?;
        receipt
            .account(id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("commit did not return account {id}")))
    }

    /// Makes `account_id` the user's only default account.
    ///
    /// A no-op if it already is.
    pub async fn set_default(&self, user_id: UserId, account_id: AccountId) -> AppResult<()> {
        let changed = self
            .retry
            .run("set_default", move || self.try_set_default(user_id, account_id))
            .await?;

        if changed {
            tracing::info!(user_id = %user_id, account_id = %account_id, "Default account changed");
        }
        Ok(())
    }

    async fn try_set_default(&self, user_id: UserId, account_id: AccountId) -> AppResult<bool> {
        let accounts = self.gateway.list_accounts(user_id).await?;
        let target = accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or_else(|| not_found_account(account_id))?;
        if target.is_default {
            return Ok(false);
        }

        let current_default = checked_default(user_id, &accounts)?;
        let mut unit = CommitUnit::new();
        unit.set_default_exclusive(user_id, account_id, current_default);
        self.gateway.commit(unit).await?;
        Ok(true)
    }

    /// Adds `delta` to an account's balance in its own commit.
    ///
    /// Meant for manual corrections; ledger mutations stage their balance
    /// changes alongside the transaction write instead.
    pub async fn adjust_balance(
        &self,
        user_id: UserId,
        account_id: AccountId,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        let delta = validate_adjustment(delta)?;
        let change = BalanceChange::new(account_id, delta);

        let balance = self
            .retry
            .run("adjust_balance", move || self.try_adjust_balance(user_id, change))
            .await?;

        tracing::info!(
            user_id = %user_id,
            account_id = %account_id,
            %delta,
            %balance,
            "Balance adjusted"
        );
        Ok(balance)
    }

    async fn try_adjust_balance(&self, user_id: UserId, change: BalanceChange) -> AppResult<Decimal> {
        let account = self.require_account(user_id, change.account_id).await?;
        if change.delta.is_zero() {
            return Ok(account.balance);
        }

        let mut unit = CommitUnit::new();
        self.stage_adjustments(&mut unit, user_id, &[change]).await?;
        let receipt = self.gateway.commit(unit).await?;
        receipt
            .account(change.account_id)
            .map(|a| a.balance)
            .ok_or_else(|| AppError::Internal(format!("commit did not return account {}", change.account_id)))
    }

    /// Stages one balance compare-and-swap per change into `unit`.
    ///
    /// Each account is read fresh, so the staged expected version is the one
    /// current at staging time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if an account is absent or not owned by `user_id`,
    /// and `Validation` if a new balance would overflow.
    pub async fn stage_adjustments(
        &self,
        unit: &mut CommitUnit,
        user_id: UserId,
        changes: &[BalanceChange],
    ) -> AppResult<()> {
        for change in changes {
            let account = self.require_account(user_id, change.account_id).await?;
            let balance = account
                .balance
                .checked_add(change.delta)
                .ok_or(LedgerError::BalanceOverflow(account.id))?;
            unit.compare_and_swap_balance(account.id, account.version, balance);
        }
        Ok(())
    }

    /// Fetches an account owned by `user_id`.
    pub async fn get_account(&self, user_id: UserId, account_id: AccountId) -> AppResult<Account> {
        self.require_account(user_id, account_id).await
    }

    async fn require_account(&self, user_id: UserId, account_id: AccountId) -> AppResult<Account> {
        self.gateway
            .get_account(user_id, account_id)
            .await?
            .ok_or_else(|| not_found_account(account_id))
    }

    /// Lists the user's accounts, newest first, with transaction counts.
    pub async fn list_accounts(&self, user_id: UserId) -> AppResult<Vec<AccountSummary>> {
        let accounts = self.gateway.list_accounts(user_id).await?;
        let counts = self.gateway.count_by_account(user_id).await?;

        Ok(accounts
            .into_iter()
            .map(|account| AccountSummary {
                transaction_count: counts.get(&account.id).copied().unwrap_or(0),
                account,
            })
            .collect())
    }

    /// Replays an account's transactions against its stored balance.
    ///
    /// Also checks the user's default-account invariant. Nothing is repaired.
    ///
    /// # Errors
    ///
    /// Returns `Integrity` when either check fails.
    pub async fn reconcile_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> AppResult<Reconciliation> {
        let report = self
            .retry
            .run("reconcile_account", move || self.try_reconcile(user_id, account_id))
            .await?;

        let accounts = self.gateway.list_accounts(user_id).await?;
        checked_default(user_id, &accounts)?;

        match report.ensure_consistent() {
            Ok(report) => {
                tracing::debug!(
                    user_id = %user_id,
                    account_id = %account_id,
                    transactions = report.transaction_count,
                    "Account reconciled"
                );
                Ok(report)
            }
            Err(violation) => {
                tracing::error!(
                    user_id = %user_id,
                    account_id = %account_id,
                    error = %violation,
                    "Balance does not reconcile with history"
                );
                Err(violation.into())
            }
        }
    }

    /// Reads account and history as one consistent snapshot.
    async fn try_reconcile(&self, user_id: UserId, account_id: AccountId) -> AppResult<Reconciliation> {
        let before = self.require_account(user_id, account_id).await?;
        let history = self
            .gateway
            .list_transactions(user_id, TransactionFilter::for_account(account_id))
            .await?;
        let after = self.require_account(user_id, account_id).await?;

        if before.version != after.version {
            return Err(AppError::Conflict(format!(
                "account {account_id} changed while reconciling"
            )));
        }
        Reconciliation::compute(&after, &history).map_err(|violation| {
            tracing::error!(
                user_id = %user_id,
                account_id = %account_id,
                error = %violation,
                "Account history cannot be replayed"
            );
            AppError::from(violation)
        })
    }
}

/// Returns the user's default account, or an integrity error if the
/// one-default rule is broken.
fn checked_default(user_id: UserId, accounts: &[Account]) -> AppResult<Option<AccountId>> {
    check_default_account(user_id, accounts).map_err(|violation| {
        tracing::error!(user_id = %user_id, error = %violation, "Default account invariant violated");
        AppError::from(violation)
    })
}

pub(crate) fn not_found_account(account_id: AccountId) -> AppError {
    AppError::NotFound(format!("Account {account_id}"))
}
