//! Property-based tests for the chart aggregator.
//!
//! - Output is independent of input order
//! - Totals equal the bucket sums and net = income - expense
//! - Buckets are strictly ascending and never empty

use chrono::{DateTime, Duration, TimeZone, Utc};
use fintrack_shared::types::{AccountId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::ReportService;
use super::types::DateRange;
use crate::ledger::{Transaction, TransactionFields, TransactionType};

fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 18, 0, 0).unwrap()
}

fn range() -> impl Strategy<Value = DateRange> {
    prop::sample::select(DateRange::ALL_RANGES.to_vec())
}

/// Transactions spread over roughly a year before the reference instant.
fn transactions() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(
        (any::<bool>(), 1i64..100_000i64, 0i64..(365 * 24)),
        0..60,
    )
    .prop_map(|rows| {
        let account = AccountId::new();
        let user = UserId::new();
        rows.into_iter()
            .map(|(income, cents, hours_back)| {
                let date = reference_now() - Duration::hours(hours_back);
                let ty = if income {
                    TransactionType::Income
                } else {
                    TransactionType::Expense
                };
                Transaction::from_fields(
                    user,
                    TransactionFields::one_off(account, ty, Decimal::new(cents, 2), "misc", date),
                    date,
                )
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_order_independent(txs in transactions(), range in range()) {
        let forward = ReportService::build_report(&txs, range, reference_now()).unwrap();
        let mut reversed = txs.clone();
        reversed.reverse();
        let backward = ReportService::build_report(&reversed, range, reference_now()).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_totals_match_buckets(txs in transactions(), range in range()) {
        let report = ReportService::build_report(&txs, range, reference_now()).unwrap();

        let income: Decimal = report.buckets.iter().map(|b| b.income).sum();
        let expense: Decimal = report.buckets.iter().map(|b| b.expense).sum();
        prop_assert_eq!(report.totals.income, income);
        prop_assert_eq!(report.totals.expense, expense);
        prop_assert_eq!(report.totals.net, income - expense);

        prop_assert!(report.buckets.windows(2).all(|w| w[0].date < w[1].date));
        prop_assert!(report.buckets.iter().all(|b| !(b.income + b.expense).is_zero()));
    }

    #[test]
    fn prop_all_range_covers_everything(txs in transactions()) {
        let report = ReportService::build_report(&txs, DateRange::All, reference_now()).unwrap();
        let expected: Decimal = txs.iter().map(Transaction::signed_delta).sum();
        prop_assert_eq!(report.totals.net, expected);
    }
}
