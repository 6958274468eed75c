//! Report generation service.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{ChartReport, DateRange, ReportBucket, ReportTotals};
use crate::ledger::{Transaction, TransactionType};

/// Service for generating chart reports.
pub struct ReportService;

impl ReportService {
    /// Builds a daily income/expense chart for `range` ending on `now`'s day.
    ///
    /// Transactions outside the window are ignored. Days with no
    /// transactions get no bucket. The result does not depend on the order
    /// of `transactions`.
    ///
    /// # Errors
    ///
    /// Returns an overflow error if a sum leaves the decimal range. Stored
    /// amounts are bounded, so this means the snapshot is corrupt.
    pub fn build_report(
        transactions: &[Transaction],
        range: DateRange,
        now: DateTime<Utc>,
    ) -> Result<ChartReport, ReportError> {
        let (start, end) = range.window(now);

        let mut by_day: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
        for tx in transactions
            .iter()
            .filter(|t| t.date <= end && start.is_none_or(|s| t.date >= s))
        {
            by_day.entry(tx.date.date_naive()).or_default().push(tx);
        }

        let days: Vec<(NaiveDate, Vec<&Transaction>)> = by_day.into_iter().collect();
        let buckets: Vec<ReportBucket> = days
            .par_iter()
            .map(|(date, txs)| Self::bucket(*date, txs))
            .collect::<Result<_, _>>()?;

        let totals = Self::totals(&buckets)?;

        Ok(ChartReport {
            range,
            start,
            end,
            buckets,
            totals,
        })
    }

    fn bucket(
        date: NaiveDate,
        transactions: &[&Transaction],
    ) -> Result<ReportBucket, ReportError> {
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        for tx in transactions {
            let sum = match tx.transaction_type {
                TransactionType::Income => &mut income,
                TransactionType::Expense => &mut expense,
            };
            *sum = sum
                .checked_add(tx.amount)
                .ok_or(ReportError::BucketOverflow(date))?;
        }
        Ok(ReportBucket {
            date,
            income,
            expense,
        })
    }

    fn totals(buckets: &[ReportBucket]) -> Result<ReportTotals, ReportError> {
        let mut totals = ReportTotals::default();
        for bucket in buckets {
            totals.income = totals
                .income
                .checked_add(bucket.income)
                .ok_or(ReportError::TotalsOverflow)?;
            totals.expense = totals
                .expense
                .checked_add(bucket.expense)
                .ok_or(ReportError::TotalsOverflow)?;
        }
        totals.net = totals
            .income
            .checked_sub(totals.expense)
            .ok_or(ReportError::TotalsOverflow)?;
        Ok(totals)
    }
}
