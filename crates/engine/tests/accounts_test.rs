//! Account store integration tests.
//!
//! Covers default-account rules, balance adjustments and reconciliation,
//! including concurrent default changes.

#![allow(clippy::uninlined_format_args)]

mod common;

use std::sync::Arc;

use fintrack_core::ledger::Account;
use fintrack_db::{AccountRepo, CommitUnit, LedgerStore};
use fintrack_shared::AppError;
use fintrack_shared::types::{AccountId, UserId};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use common::{income, new_account, open_account, setup};

fn defaults(accounts: &[Account]) -> Vec<AccountId> {
    accounts.iter().filter(|a| a.is_default).map(|a| a.id).collect()
}

#[tokio::test]
async fn test_first_account_is_forced_default() {
    let (_, engine) = setup();
    let user = UserId::new();

    let first = engine
        .accounts
        .create_account(user, new_account("Wallet", dec!(10), false))
        .await
        .unwrap();
    assert!(first.is_default);
    assert_eq!(first.balance, dec!(10.00));
    assert_eq!(first.opening_balance, dec!(10.00));

    let second = engine
        .accounts
        .create_account(user, new_account("Savings", dec!(0), false))
        .await
        .unwrap();
    assert!(!second.is_default);
}

#[tokio::test]
async fn test_requested_default_takes_over() {
    let (_, engine) = setup();
    let user = UserId::new();
    let first = open_account(&engine, user, dec!(0)).await;

    let second = engine
        .accounts
        .create_account(user, new_account("Travel", dec!(5), true))
        .await
        .unwrap();
    assert!(second.is_default);

    let listed = engine.accounts.list_accounts(user).await.unwrap();
    let accounts: Vec<Account> = listed.into_iter().map(|s| s.account).collect();
    assert_eq!(defaults(&accounts), vec![second.id]);
    assert!(accounts.iter().any(|a| a.id == first.id && !a.is_default));
}

#[tokio::test]
async fn test_create_account_validation() {
    let (_, engine) = setup();
    let user = UserId::new();

    let negative = engine
        .accounts
        .create_account(user, new_account("Main", dec!(-1), false))
        .await;
    assert!(matches!(negative, Err(AppError::Validation(_))));

    let blank = engine
        .accounts
        .create_account(user, new_account("   ", dec!(1), false))
        .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    assert!(engine.accounts.list_accounts(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_default() {
    let (_, engine) = setup();
    let user = UserId::new();
    let first = open_account(&engine, user, dec!(0)).await;
    let second = open_account(&engine, user, dec!(0)).await;

    // Already default: no-op.
    engine.accounts.set_default(user, first.id).await.unwrap();
    let unchanged = engine.accounts.get_account(user, first.id).await.unwrap();
    assert_eq!(unchanged.version, first.version);

    engine.accounts.set_default(user, second.id).await.unwrap();
    let accounts: Vec<Account> = engine
        .accounts
        .list_accounts(user)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.account)
        .collect();
    assert_eq!(defaults(&accounts), vec![second.id]);

    let stranger = UserId::new();
    assert!(matches!(
        engine.accounts.set_default(stranger, second.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_accounts_yield_one_default() {
    let (_, engine) = setup();
    let engine = Arc::new(engine);
    let user = UserId::new();

    let creates = (0..20).map(|i| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .accounts
                .create_account(user, new_account(&format!("Account {}", i), dec!(0), false))
                .await
        })
    });
    for result in join_all(creates).await {
        result.unwrap().unwrap();
    }

    let accounts: Vec<Account> = engine
        .accounts
        .list_accounts(user)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.account)
        .collect();
    assert_eq!(accounts.len(), 20);
    assert_eq!(defaults(&accounts).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_set_default_keeps_one_default() {
    let (_, engine) = setup();
    let engine = Arc::new(engine);
    let user = UserId::new();

    let mut ids = Vec::new();
    for _ in 0..8 {
        ids.push(open_account(&engine, user, dec!(0)).await.id);
    }

    let swaps = ids.iter().cycle().take(40).map(|&id| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.accounts.set_default(user, id).await })
    });
    for result in join_all(swaps).await {
        result.unwrap().unwrap();
    }

    let accounts: Vec<Account> = engine
        .accounts
        .list_accounts(user)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.account)
        .collect();
    assert_eq!(defaults(&accounts).len(), 1);
}

#[tokio::test]
async fn test_list_accounts_newest_first_with_counts() {
    let (_, engine) = setup();
    let user = UserId::new();
    let older = open_account(&engine, user, dec!(0)).await;
    let newer = open_account(&engine, user, dec!(0)).await;

    for _ in 0..3 {
        engine
            .ledger
            .create_transaction(user, income(older.id, dec!(1)))
            .await
            .unwrap();
    }

    let listed = engine.accounts.list_accounts(user).await.unwrap();
    assert_eq!(listed[0].account.id, newer.id);
    assert_eq!(listed[0].transaction_count, 0);
    assert_eq!(listed[1].account.id, older.id);
    assert_eq!(listed[1].transaction_count, 3);
}

#[tokio::test]
async fn test_adjust_balance() {
    let (_, engine) = setup();
    let user = UserId::new();
    let account = open_account(&engine, user, dec!(100)).await;

    let balance = engine
        .accounts
        .adjust_balance(user, account.id, dec!(-30.005))
        .await
        .unwrap();
    assert_eq!(balance, dec!(70.00));

    assert!(matches!(
        engine.accounts.adjust_balance(UserId::new(), account.id, Decimal::ONE).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_reconcile_detects_out_of_band_balance_write() {
    let (store, engine) = setup();
    let user = UserId::new();
    let account = open_account(&engine, user, dec!(50)).await;
    engine
        .ledger
        .create_transaction(user, income(account.id, dec!(25)))
        .await
        .unwrap();

    let report = engine.accounts.reconcile_account(user, account.id).await.unwrap();
    assert_eq!(report.expected_balance, dec!(75.00));
    assert_eq!(report.transaction_count, 1);

    // Bypass the ledger and corrupt the balance directly.
    let current = store.get_account(user, account.id).await.unwrap().unwrap();
    let mut unit = CommitUnit::new();
    unit.compare_and_swap_balance(account.id, current.version, dec!(999));
    store.commit(unit).await.unwrap();

    let err = engine.accounts.reconcile_account(user, account.id).await.unwrap_err();
    assert!(matches!(err, AppError::Integrity(_)));
    assert!(err.is_fatal());

    // Nothing was repaired.
    let after = engine.accounts.get_account(user, account.id).await.unwrap();
    assert_eq!(after.balance, dec!(999));
}
