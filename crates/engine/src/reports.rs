//! Chart reports over an account's transactions.

use chrono::{DateTime, Utc};
use fintrack_core::reports::{ChartReport, DateRange, ReportService};
use fintrack_db::TransactionFilter;
use fintrack_shared::{AppError, AppResult};
use fintrack_shared::types::{AccountId, UserId};

use crate::accounts::not_found_account;
use crate::gateway::{Backend, Gateway};

/// Read-only report builder.
pub struct ChartReports<S> {
    gateway: Gateway<S>,
}

impl<S: Backend> ChartReports<S> {
    /// Creates the service.
    pub fn new(gateway: Gateway<S>) -> Self {
        Self { gateway }
    }

    /// Builds the daily income/expense chart of one account.
    pub async fn build_chart_report(
        &self,
        user_id: UserId,
        account_id: AccountId,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> AppResult<ChartReport> {
        self.gateway
            .get_account(user_id, account_id)
            .await?
            .ok_or_else(|| not_found_account(account_id))?;

        let snapshot = self
            .gateway
            .list_transactions(user_id, TransactionFilter::for_account(account_id))
            .await?;
        let report = ReportService::build_report(&snapshot, range, now).map_err(|err| {
            tracing::error!(
                user_id = %user_id,
                account_id = %account_id,
                error = %err,
                "Chart report sums overflow"
            );
            AppError::from(err)
        })?;

        tracing::debug!(
            user_id = %user_id,
            account_id = %account_id,
            range = %range,
            buckets = report.buckets.len(),
            "Chart report built"
        );
        Ok(report)
    }

    /// Same as [`build_chart_report`](Self::build_chart_report), with the
    /// range given by its label (`"7D"`, `"1M"`, `"3M"`, `"6M"`, `"ALL"`).
    pub async fn build_chart_report_for_label(
        &self,
        user_id: UserId,
        account_id: AccountId,
        range: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ChartReport> {
        let range: DateRange = range.parse()?;
        self.build_chart_report(user_id, account_id, range, now).await
    }
}
