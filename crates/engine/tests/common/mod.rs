//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use fintrack_core::ledger::{Account, AccountType, TransactionFields, TransactionType};
use fintrack_db::InMemoryStore;
use fintrack_engine::{Engine, NewAccount};
use fintrack_shared::AppConfig;
use fintrack_shared::config::RetryConfig;
use fintrack_shared::types::{AccountId, UserId, WorkerId};
use rust_decimal::Decimal;

/// Config with a retry budget sized for heavy contention on one account.
pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.engine.retry = RetryConfig {
        max_attempts: 64,
        base_delay_ms: 1,
        max_delay_ms: 50,
    };
    config
}

/// Fresh store plus an engine over it.
pub fn setup() -> (Arc<InMemoryStore>, Engine<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let engine = Engine::new(Arc::clone(&store), &config());
    (store, engine)
}

/// Second engine over the same store with its own worker identity.
pub fn worker(store: &Arc<InMemoryStore>, config: &AppConfig) -> Engine<InMemoryStore> {
    Engine::with_worker(Arc::clone(store), config, WorkerId::new())
}

pub fn new_account(name: &str, balance: Decimal, is_default: bool) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        account_type: AccountType::Current,
        initial_balance: balance,
        is_default,
    }
}

pub async fn open_account(
    engine: &Engine<InMemoryStore>,
    user_id: UserId,
    balance: Decimal,
) -> Account {
    engine
        .accounts
        .create_account(user_id, new_account("Main", balance, false))
        .await
        .expect("account created")
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn income(account_id: AccountId, amount: Decimal) -> TransactionFields {
    TransactionFields::one_off(
        account_id,
        TransactionType::Income,
        amount,
        "salary",
        at(2024, 5, 1, 9),
    )
}

pub fn expense(account_id: AccountId, amount: Decimal) -> TransactionFields {
    TransactionFields::one_off(
        account_id,
        TransactionType::Expense,
        amount,
        "groceries",
        at(2024, 5, 2, 9),
    )
}

pub async fn balance_of(engine: &Engine<InMemoryStore>, user_id: UserId, account_id: AccountId) -> Decimal {
    engine
        .accounts
        .get_account(user_id, account_id)
        .await
        .expect("account exists")
        .balance
}
