//! Report types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReportError;

/// Lookback window selector for chart reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateRange {
    /// Last 7 days.
    #[serde(rename = "7D")]
    SevenDays,
    /// Last 30 days.
    #[serde(rename = "1M")]
    OneMonth,
    /// Last 90 days.
    #[serde(rename = "3M")]
    ThreeMonths,
    /// Last 180 days.
    #[serde(rename = "6M")]
    SixMonths,
    /// No lower bound.
    #[serde(rename = "ALL")]
    All,
}

impl DateRange {
    /// All selectors, shortest window first.
    pub const ALL_RANGES: [Self; 5] = [
        Self::SevenDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::All,
    ];

    /// Selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SevenDays => "7D",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::All => "ALL",
        }
    }

    /// Days to look back from the reference day, `None` for no lower bound.
    #[must_use]
    pub const fn lookback_days(self) -> Option<u64> {
        match self {
            Self::SevenDays => Some(7),
            Self::OneMonth => Some(30),
            Self::ThreeMonths => Some(90),
            Self::SixMonths => Some(180),
            Self::All => None,
        }
    }

    /// Inclusive window `[start, end]` for a reference instant.
    ///
    /// `end` is the last instant of `now`'s UTC day; `start` is the first
    /// instant of the day `lookback_days` earlier.
    #[must_use]
    pub fn window(self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, DateTime<Utc>) {
        let today = now.date_naive();
        let end = today.and_time(end_of_day()).and_utc();
        let start = self.lookback_days().map(|days| {
            today
                .checked_sub_days(Days::new(days))
                .unwrap_or(NaiveDate::MIN)
                .and_time(NaiveTime::MIN)
                .and_utc()
        });
        (start, end)
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DateRange {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_RANGES
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ReportError::UnknownRange(s.to_string()))
    }
}

/// Income and expense summed for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBucket {
    /// The UTC calendar day.
    pub date: NaiveDate,
    /// Total income on the day.
    pub income: Decimal,
    /// Total expense on the day.
    pub expense: Decimal,
}

/// Totals across all buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    /// Total income.
    pub income: Decimal,
    /// Total expense.
    pub expense: Decimal,
    /// Income minus expense.
    pub net: Decimal,
}

/// Daily income/expense chart over a lookback window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartReport {
    /// Selected window.
    pub range: DateRange,
    /// Inclusive window start, `None` for [`DateRange::All`].
    pub start: Option<DateTime<Utc>>,
    /// Inclusive window end.
    pub end: DateTime<Utc>,
    /// Non-empty days, ascending.
    pub buckets: Vec<ReportBucket>,
    /// Sums across `buckets`.
    pub totals: ReportTotals,
}
