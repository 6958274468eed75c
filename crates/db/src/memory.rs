//! In-memory reference store.
//!
//! All ledger state sits behind one `tokio::sync::RwLock`. A commit takes the
//! write lock, validates and applies the whole unit, and releases it without
//! awaiting in between, so a cancelled caller either committed everything or
//! nothing. Simulated latency is spent before the lock is taken.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fintrack_core::ledger::{Account, Transaction, TransactionStatus};
use fintrack_shared::types::{AccountId, TransactionId, UserId, WorkerId};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::repositories::{
    AccountRepo, CommitOp, CommitReceipt, CommitUnit, LeaseRepo, LedgerStore, TransactionFilter,
    TransactionRepo,
};
use crate::snapshot::StoreSnapshot;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
}

#[derive(Debug, Clone, Copy)]
struct Lease {
    holder: WorkerId,
    expires_at: DateTime<Utc>,
}

/// Ledger store kept in process memory.
#[derive(Debug)]
pub struct InMemoryStore {
    state: RwLock<State>,
    leases: DashMap<TransactionId, Lease>,
    latency_ms: AtomicU64,
    available: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty, reachable store with no added latency.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            leases: DashMap::new(),
            latency_ms: AtomicU64::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Delays every call by `latency` before it touches state.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::Release);
    }

    /// Makes every call fail with `Unavailable` while `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Builds a store holding the records of `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` for a repeated id, and `Missing` for a transaction
    /// whose account is absent or belongs to another user.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut state = State::default();
        for account in snapshot.accounts {
            let id = account.id;
            if state.accounts.insert(id, account).is_some() {
                return Err(StoreError::Duplicate(format!("account {id}")));
            }
        }
        for transaction in snapshot.transactions {
            let id = transaction.id;
            let owned = state
                .accounts
                .get(&transaction.account_id)
                .is_some_and(|a| a.user_id == transaction.user_id);
            if !owned {
                return Err(StoreError::Missing(format!(
                    "account {} of transaction {id}",
                    transaction.account_id
                )));
            }
            if state.transactions.insert(id, transaction).is_some() {
                return Err(StoreError::Duplicate(format!("transaction {id}")));
            }
        }

        Ok(Self {
            state: RwLock::new(state),
            ..Self::new()
        })
    }

    /// Copies every account and transaction, oldest first.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        let mut transactions: Vec<Transaction> = state.transactions.values().cloned().collect();
        transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        StoreSnapshot {
            accounts,
            transactions,
        }
    }

    async fn round_trip(&self) -> Result<(), StoreError> {
        let millis = self.latency_ms.load(Ordering::Acquire);
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        if !self.available.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepo for InMemoryStore {
    async fn get_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
    ) -> Result<Option<Account>, StoreError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        Ok(state
            .accounts
            .get(&account_id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_accounts(&self, user_id: UserId) -> Result<Vec<Account>, StoreError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(accounts)
    }
}

#[async_trait]
impl TransactionRepo for InMemoryStore {
    async fn get_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        Ok(state
            .transactions
            .get(&transaction_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list_transactions(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        let mut transactions: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    async fn count_by_account(
        &self,
        user_id: UserId,
    ) -> Result<HashMap<AccountId, u64>, StoreError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        let mut counts: HashMap<AccountId, u64> = HashMap::new();
        for tx in state.transactions.values().filter(|t| t.user_id == user_id) {
            *counts.entry(tx.account_id).or_default() += 1;
        }
        Ok(counts)
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.round_trip().await?;
        let state = self.state.read().await;
        let mut due: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.next_occurrence_date
                .cmp(&b.next_occurrence_date)
                .then(a.id.cmp(&b.id))
        });
        due.truncate(limit);
        Ok(due)
    }
}

#[async_trait]
impl LeaseRepo for InMemoryStore {
    async fn try_acquire(
        &self,
        key: TransactionId,
        holder: WorkerId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        self.round_trip().await?;
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let lease = Lease { holder, expires_at };

        let acquired = match self.leases.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(lease);
                true
            }
            Entry::Occupied(mut entry) => {
                let current = *entry.get();
                if current.holder == holder || current.expires_at <= now {
                    entry.insert(lease);
                    true
                } else {
                    false
                }
            }
        };
        Ok(acquired)
    }

    async fn release(&self, key: TransactionId, holder: WorkerId) -> Result<(), StoreError> {
        self.round_trip().await?;
        self.leases.remove_if(&key, |_, lease| lease.holder == holder);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn commit(&self, unit: CommitUnit) -> Result<CommitReceipt, StoreError> {
        self.round_trip().await?;

        let mut state = self.state.write().await;
        let staged = {
            let mut overlay = Overlay::new(&state);
            for op in unit.into_ops() {
                overlay.apply(op)?;
            }
            overlay.into_staged()
        };

        let mut receipt = CommitReceipt::default();
        for account in staged.accounts {
            state.accounts.insert(account.id, account.clone());
            receipt.accounts.push(account);
        }
        for (id, written) in staged.transactions {
            match written {
                Some(tx) => {
                    state.transactions.insert(id, tx.clone());
                    receipt.transactions.push(tx);
                }
                None => {
                    state.transactions.remove(&id);
                }
            }
        }
        drop(state);

        tracing::trace!(
            accounts = receipt.accounts.len(),
            transactions = receipt.transactions.len(),
            "Commit applied"
        );
        Ok(receipt)
    }
}

/// Writes staged by one unit, in first-touch order.
struct Staged {
    accounts: Vec<Account>,
    transactions: Vec<(TransactionId, Option<Transaction>)>,
}

/// Copy-on-write view of the state while a unit is validated.
struct Overlay<'a> {
    base: &'a State,
    staged: Staged,
}

impl<'a> Overlay<'a> {
    fn new(base: &'a State) -> Self {
        Self {
            base,
            staged: Staged {
                accounts: Vec::new(),
                transactions: Vec::new(),
            },
        }
    }

    fn into_staged(self) -> Staged {
        self.staged
    }

    fn account(&self, id: AccountId) -> Option<Account> {
        self.staged
            .accounts
            .iter()
            .find(|a| a.id == id)
            .or_else(|| self.base.accounts.get(&id))
            .cloned()
    }

    fn owned_account(&self, user_id: UserId, id: AccountId) -> Result<Account, StoreError> {
        self.account(id)
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| StoreError::Missing(format!("account {id}")))
    }

    fn put_account(&mut self, account: Account) {
        match self.staged.accounts.iter_mut().find(|a| a.id == account.id) {
            Some(slot) => *slot = account,
            None => self.staged.accounts.push(account),
        }
    }

    fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        match self.staged.transactions.iter().find(|(tid, _)| *tid == id) {
            Some((_, written)) => written.clone(),
            None => self.base.transactions.get(&id).cloned(),
        }
    }

    fn put_transaction(&mut self, id: TransactionId, written: Option<Transaction>) {
        match self.staged.transactions.iter_mut().find(|(tid, _)| *tid == id) {
            Some(slot) => slot.1 = written,
            None => self.staged.transactions.push((id, written)),
        }
    }

    /// The user's default account as seen through the overlay.
    fn current_default(&self, user_id: UserId) -> Option<AccountId> {
        let staged = self
            .staged
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id && a.is_default)
            .map(|a| a.id);
        let base = self
            .base
            .accounts
            .values()
            .filter(|a| a.user_id == user_id && a.is_default)
            .filter(|a| !self.staged.accounts.iter().any(|s| s.id == a.id))
            .map(|a| a.id);
        staged.chain(base).min()
    }

    fn expect_default(&self, user_id: UserId, expected: Option<AccountId>) -> Result<(), StoreError> {
        let current = self.current_default(user_id);
        if current == expected {
            Ok(())
        } else {
            Err(StoreError::Conflict(format!(
                "default account for user {user_id} changed"
            )))
        }
    }

    fn demote(&mut self, account_id: AccountId) {
        if let Some(mut account) = self.account(account_id) {
            account.is_default = false;
            account.version += 1;
            self.put_account(account);
        }
    }

    fn apply(&mut self, op: CommitOp) -> Result<(), StoreError> {
        match op {
            CommitOp::CreateAccount {
                account,
                expected_default,
            } => {
                if self.account(account.id).is_some() {
                    return Err(StoreError::Duplicate(format!("account {}", account.id)));
                }
                self.expect_default(account.user_id, expected_default)?;
                if account.is_default
                    && let Some(previous) = expected_default
                {
                    self.demote(previous);
                }
                self.put_account(account);
            }

            CommitOp::CompareAndSwapBalance {
                account_id,
                expected_version,
                new_balance,
            } => {
                let mut account = self
                    .account(account_id)
                    .ok_or_else(|| StoreError::Missing(format!("account {account_id}")))?;
                if account.version != expected_version {
                    return Err(StoreError::Conflict(format!(
                        "account {account_id} is at version {}, expected {expected_version}",
                        account.version
                    )));
                }
                account.balance = new_balance;
                account.version += 1;
                self.put_account(account);
            }

            CommitOp::SetDefaultExclusive {
                user_id,
                account_id,
                expected_default,
            } => {
                let mut target = self.owned_account(user_id, account_id)?;
                self.expect_default(user_id, expected_default)?;
                if expected_default != Some(account_id) {
                    if let Some(previous) = expected_default {
                        self.demote(previous);
                    }
                    target.is_default = true;
                    target.version += 1;
                    self.put_account(target);
                }
            }

            CommitOp::CreateTransaction { transaction } => {
                if self.transaction(transaction.id).is_some()
                    || self.base.transactions.contains_key(&transaction.id)
                {
                    return Err(StoreError::Duplicate(format!("transaction {}", transaction.id)));
                }
                self.owned_account(transaction.user_id, transaction.account_id)?;
                self.put_transaction(transaction.id, Some(transaction));
            }

            CommitOp::UpdateTransaction {
                mut transaction,
                expected_version,
            } => {
                let current = self
                    .transaction(transaction.id)
                    .filter(|t| t.user_id == transaction.user_id)
                    .ok_or_else(|| StoreError::Missing(format!("transaction {}", transaction.id)))?;
                if current.version != expected_version {
                    return Err(StoreError::Conflict(format!(
                        "transaction {} is at version {}, expected {expected_version}",
                        transaction.id, current.version
                    )));
                }
                self.owned_account(transaction.user_id, transaction.account_id)?;
                transaction.version = current.version + 1;
                self.put_transaction(transaction.id, Some(transaction));
            }

            CommitOp::DeleteTransaction {
                user_id,
                transaction_id,
                expected_version,
            } => {
                let current = self
                    .transaction(transaction_id)
                    .filter(|t| t.user_id == user_id)
                    .ok_or_else(|| StoreError::Missing(format!("transaction {transaction_id}")))?;
                if current.version != expected_version {
                    return Err(StoreError::Conflict(format!(
                        "transaction {transaction_id} is at version {}, expected {expected_version}",
                        current.version
                    )));
                }
                self.put_transaction(transaction_id, None);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fintrack_core::ledger::{AccountType, TransactionFields, TransactionType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn account(user_id: UserId, is_default: bool, balance: Decimal) -> Account {
        Account {
            id: AccountId::new(),
            user_id,
            name: "Main".to_string(),
            account_type: AccountType::Current,
            balance,
            opening_balance: balance,
            is_default,
            created_at: now(),
            version: 1,
        }
    }

    async fn seed(store: &InMemoryStore, account: Account, expected_default: Option<AccountId>) {
        let mut unit = CommitUnit::new();
        unit.create_account(account, expected_default);
        store.commit(unit).await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let acc = account(user, true, dec!(10.00));
        seed(&store, acc.clone(), None).await;

        let tx = Transaction::from_fields(
            user,
            TransactionFields::one_off(acc.id, TransactionType::Income, dec!(5.00), "misc", now()),
            now(),
        );

        // Stale version on the balance write sinks the whole unit.
        let mut unit = CommitUnit::new();
        unit.create_transaction(tx.clone())
            .compare_and_swap_balance(acc.id, 7, dec!(15.00));
        assert!(matches!(store.commit(unit).await, Err(StoreError::Conflict(_))));
        assert_eq!(store.get_transaction(user, tx.id).await.unwrap(), None);
        let unchanged = store.get_account(user, acc.id).await.unwrap().unwrap();
        assert_eq!(unchanged.balance, dec!(10.00));
        assert_eq!(unchanged.version, 1);

        let mut unit = CommitUnit::new();
        unit.create_transaction(tx.clone())
            .compare_and_swap_balance(acc.id, 1, dec!(15.00));
        let receipt = store.commit(unit).await.unwrap();
        assert_eq!(receipt.account(acc.id).unwrap().balance, dec!(15.00));
        assert_eq!(receipt.account(acc.id).unwrap().version, 2);
        assert!(receipt.transaction(tx.id).is_some());
    }

    #[tokio::test]
    async fn test_default_swap_checks_expectation() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let first = account(user, true, Decimal::ZERO);
        let second = account(user, false, Decimal::ZERO);
        seed(&store, first.clone(), None).await;
        seed(&store, second.clone(), Some(first.id)).await;

        let mut stale = CommitUnit::new();
        stale.set_default_exclusive(user, second.id, None);
        assert!(matches!(store.commit(stale).await, Err(StoreError::Conflict(_))));

        let mut unit = CommitUnit::new();
        unit.set_default_exclusive(user, second.id, Some(first.id));
        store.commit(unit).await.unwrap();

        let accounts = store.list_accounts(user).await.unwrap();
        let defaults: Vec<AccountId> = accounts.iter().filter(|a| a.is_default).map(|a| a.id).collect();
        assert_eq!(defaults, vec![second.id]);
    }

    #[tokio::test]
    async fn test_create_default_account_demotes_previous() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let first = account(user, true, Decimal::ZERO);
        seed(&store, first.clone(), None).await;
        seed(&store, account(user, true, Decimal::ZERO), Some(first.id)).await;

        let demoted = store.get_account(user, first.id).await.unwrap().unwrap();
        assert!(!demoted.is_default);
        assert_eq!(demoted.version, 2);
    }

    #[tokio::test]
    async fn test_reads_are_owner_scoped() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let acc = account(owner, true, Decimal::ZERO);
        seed(&store, acc.clone(), None).await;

        assert!(store.get_account(UserId::new(), acc.id).await.unwrap().is_none());
        assert!(store.list_accounts(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lease_exclusive_until_expiry() {
        let store = InMemoryStore::new();
        let key = TransactionId::new();
        let (a, b) = (WorkerId::new(), WorkerId::new());
        let ttl = Duration::from_secs(30);

        assert!(store.try_acquire(key, a, now(), ttl).await.unwrap());
        assert!(!store.try_acquire(key, b, now(), ttl).await.unwrap());
        assert!(store.try_acquire(key, a, now(), ttl).await.unwrap());

        let later = now() + TimeDelta::seconds(31);
        assert!(store.try_acquire(key, b, later, ttl).await.unwrap());

        store.release(key, a).await.unwrap();
        assert!(!store.try_acquire(key, a, later, ttl).await.unwrap());
        store.release(key, b).await.unwrap();
        assert!(store.try_acquire(key, a, later, ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let store = InMemoryStore::new();
        store.set_available(false);
        assert!(matches!(
            store.list_accounts(UserId::new()).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_restores_into_a_new_store() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        let acc = account(user, true, dec!(10.00));
        seed(&store, acc.clone(), None).await;
        let tx = Transaction::from_fields(
            user,
            TransactionFields::one_off(acc.id, TransactionType::Income, dec!(5.00), "misc", now()),
            now(),
        );
        let mut unit = CommitUnit::new();
        unit.create_transaction(tx.clone())
            .compare_and_swap_balance(acc.id, 1, dec!(15.00));
        store.commit(unit).await.unwrap();

        let restored = InMemoryStore::from_snapshot(store.snapshot().await).unwrap();
        let account = restored.get_account(user, acc.id).await.unwrap().unwrap();
        assert_eq!(account.balance, dec!(15.00));
        assert_eq!(account.version, 2);
        assert_eq!(restored.get_transaction(user, tx.id).await.unwrap(), Some(tx));
        assert_eq!(restored.snapshot().await, store.snapshot().await);
    }

    #[tokio::test]
    async fn test_snapshot_with_foreign_transaction_is_rejected() {
        let owner = account(UserId::new(), true, dec!(0.00));
        let stranger = UserId::new();
        let tx = Transaction::from_fields(
            stranger,
            TransactionFields::one_off(owner.id, TransactionType::Expense, dec!(1.00), "misc", now()),
            now(),
        );
        let snapshot = StoreSnapshot {
            accounts: vec![owner.clone(), owner],
            transactions: vec![],
        };
        assert!(matches!(
            InMemoryStore::from_snapshot(snapshot),
            Err(StoreError::Duplicate(_))
        ));

        let snapshot = StoreSnapshot {
            accounts: vec![account(UserId::new(), true, dec!(0.00))],
            transactions: vec![tx],
        };
        assert!(matches!(
            InMemoryStore::from_snapshot(snapshot),
            Err(StoreError::Missing(_))
        ));
    }
}
