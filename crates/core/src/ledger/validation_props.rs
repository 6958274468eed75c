//! Property-based tests for ledger validation and balance deltas.
//!
//! - Amount normalisation never changes a whole-cent amount
//! - Recurring fields are accepted iff interval presence matches the flag
//! - Applying the balance changes of any create/update/delete sequence leaves
//!   each balance equal to opening + sum of surviving transaction deltas

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use fintrack_shared::types::AccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{BalanceChange, balance_changes};
use super::error::LedgerError;
use super::types::{TransactionFields, TransactionType};
use super::validation::{validate_amount, validate_fields};
use crate::recurring::RecurringInterval;

/// Strategy to generate positive amounts in whole cents (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn transaction_type() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::Income), Just(TransactionType::Expense)]
}

fn interval() -> impl Strategy<Value = Option<RecurringInterval>> {
    prop_oneof![
        Just(None),
        Just(Some(RecurringInterval::Daily)),
        Just(Some(RecurringInterval::Weekly)),
        Just(Some(RecurringInterval::Monthly)),
        Just(Some(RecurringInterval::Yearly)),
    ]
}

/// One step of a mutation script against a fixed pool of accounts.
#[derive(Debug, Clone)]
enum Op {
    Create { account: usize, ty: TransactionType, amount: Decimal },
    Update { slot: usize, account: usize, ty: TransactionType, amount: Decimal },
    Delete { slot: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, transaction_type(), positive_amount())
            .prop_map(|(account, ty, amount)| Op::Create { account, ty, amount }),
        (0usize..8, 0usize..3, transaction_type(), positive_amount()).prop_map(
            |(slot, account, ty, amount)| Op::Update { slot, account, ty, amount }
        ),
        (0usize..8).prop_map(|slot| Op::Delete { slot }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Whole-cent positive amounts pass validation unchanged.
    #[test]
    fn prop_whole_cent_amounts_unchanged(amount in positive_amount()) {
        prop_assert_eq!(validate_amount(amount).unwrap(), amount);
    }

    /// Non-positive amounts are always rejected.
    #[test]
    fn prop_non_positive_amounts_rejected(cents in -1_000_000i64..=0) {
        let result = validate_amount(Decimal::new(cents, 2));
        prop_assert!(matches!(result, Err(LedgerError::ZeroAmount | LedgerError::NegativeAmount)));
    }

    /// Recurring fields validate iff the interval is present exactly when recurring.
    #[test]
    fn prop_recurring_consistency(is_recurring in any::<bool>(), interval in interval()) {
        let fields = TransactionFields {
            is_recurring,
            recurring_interval: interval,
            ..TransactionFields::one_off(
                AccountId::new(),
                TransactionType::Income,
                Decimal::ONE,
                "misc",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            )
        };
        let consistent = is_recurring == interval.is_some();
        prop_assert_eq!(validate_fields(fields).is_ok(), consistent);
    }

    /// Balances track opening + sum of surviving deltas across any script.
    #[test]
    fn prop_balance_changes_track_surviving_deltas(script in prop::collection::vec(op(), 1..40)) {
        let accounts: Vec<AccountId> = (0..3).map(|_| AccountId::new()).collect();
        let mut balances: HashMap<AccountId, Decimal> =
            accounts.iter().map(|id| (*id, Decimal::ZERO)).collect();
        let mut live: Vec<BalanceChange> = Vec::new();

        let mut apply = |changes: Vec<BalanceChange>, balances: &mut HashMap<AccountId, Decimal>| {
            for change in changes {
                *balances.entry(change.account_id).or_default() += change.delta;
            }
        };

        for step in script {
            match step {
                Op::Create { account, ty, amount } => {
                    let effect = BalanceChange::new(accounts[account], ty.signed(amount));
                    apply(balance_changes(None, Some(effect)), &mut balances);
                    live.push(effect);
                }
                Op::Update { slot, account, ty, amount } if !live.is_empty() => {
                    let slot = slot % live.len();
                    let effect = BalanceChange::new(accounts[account], ty.signed(amount));
                    apply(balance_changes(Some(live[slot]), Some(effect)), &mut balances);
                    live[slot] = effect;
                }
                Op::Delete { slot } if !live.is_empty() => {
                    let removed = live.remove(slot % live.len());
                    apply(balance_changes(Some(removed), None), &mut balances);
                }
                _ => {}
            }
        }

        for account in &accounts {
            let expected: Decimal = live
                .iter()
                .filter(|c| c.account_id == *account)
                .map(|c| c.delta)
                .sum();
            prop_assert_eq!(balances[account], expected);
        }
    }

    /// Updating X -> Y -> X leaves every balance where it started.
    #[test]
    fn prop_update_round_trip_restores_balance(
        ty_a in transaction_type(),
        ty_b in transaction_type(),
        a in positive_amount(),
        b in positive_amount(),
        move_account in any::<bool>(),
    ) {
        let first = AccountId::new();
        let second = if move_account { AccountId::new() } else { first };
        let x = BalanceChange::new(first, ty_a.signed(a));
        let y = BalanceChange::new(second, ty_b.signed(b));

        let mut net: HashMap<AccountId, Decimal> = HashMap::new();
        for change in balance_changes(Some(x), Some(y))
            .into_iter()
            .chain(balance_changes(Some(y), Some(x)))
        {
            *net.entry(change.account_id).or_default() += change.delta;
        }
        prop_assert!(net.values().all(Decimal::is_zero));
    }
}
