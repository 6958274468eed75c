//! Next-occurrence arithmetic and catch-up planning.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::interval::RecurringInterval;

/// Pure scheduling functions for recurring templates.
pub struct RecurringScheduler;

/// Occurrences a due template must materialize in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchUpPlan {
    /// Occurrence dates to materialize, oldest first.
    pub occurrences: Vec<DateTime<Utc>>,
    /// First occurrence left unmaterialized after this pass.
    pub next_occurrence: DateTime<Utc>,
    /// True when the cap stopped the pass while occurrences were still due.
    pub truncated: bool,
}

impl RecurringScheduler {
    /// Computes the occurrence that follows `date`.
    ///
    /// Time of day is preserved. Monthly and yearly steps clamp to the last
    /// day of the target month, so Jan 31 is followed by Feb 28 or Feb 29.
    /// The result saturates at the latest representable instant.
    #[must_use]
    pub fn compute_next_date(date: DateTime<Utc>, interval: RecurringInterval) -> DateTime<Utc> {
        let next = match interval {
            RecurringInterval::Daily => date.checked_add_days(Days::new(1)),
            RecurringInterval::Weekly => date.checked_add_days(Days::new(7)),
            RecurringInterval::Monthly => date.checked_add_months(Months::new(1)),
            RecurringInterval::Yearly => date.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Calendar-date form of [`compute_next_date`](Self::compute_next_date).
    #[must_use]
    pub fn next_calendar_date(date: NaiveDate, interval: RecurringInterval) -> NaiveDate {
        let next = match interval {
            RecurringInterval::Daily => date.checked_add_days(Days::new(1)),
            RecurringInterval::Weekly => date.checked_add_days(Days::new(7)),
            RecurringInterval::Monthly => date.checked_add_months(Months::new(1)),
            RecurringInterval::Yearly => date.checked_add_months(Months::new(12)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// Plans the catch-up for a template whose next occurrence is `next`.
    ///
    /// Every occurrence dated at or before `now` is due. At most `cap`
    /// occurrences are planned; if more remain due the plan is truncated and
    /// `next_occurrence` points at the first one left behind.
    #[must_use]
    pub fn plan_catch_up(
        next: DateTime<Utc>,
        interval: RecurringInterval,
        now: DateTime<Utc>,
        cap: u32,
    ) -> CatchUpPlan {
        let mut occurrences = Vec::new();
        let mut cursor = next;
        let mut truncated = false;

        while cursor <= now {
            if occurrences.len() >= cap as usize {
                truncated = true;
                break;
            }
            occurrences.push(cursor);
            let following = Self::compute_next_date(cursor, interval);
            if following == cursor {
                break;
            }
            cursor = following;
        }

        CatchUpPlan {
            occurrences,
            next_occurrence: cursor,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 30, 0).unwrap()
    }

    #[rstest]
    #[case(day(2024, 1, 31), RecurringInterval::Monthly, day(2024, 2, 29))]
    #[case(day(2023, 1, 31), RecurringInterval::Monthly, day(2023, 2, 28))]
    #[case(day(2024, 3, 31), RecurringInterval::Monthly, day(2024, 4, 30))]
    #[case(day(2024, 12, 15), RecurringInterval::Monthly, day(2025, 1, 15))]
    #[case(day(2024, 2, 29), RecurringInterval::Yearly, day(2025, 2, 28))]
    #[case(day(2023, 6, 1), RecurringInterval::Yearly, day(2024, 6, 1))]
    #[case(day(2024, 2, 28), RecurringInterval::Daily, day(2024, 2, 29))]
    #[case(day(2024, 12, 31), RecurringInterval::Daily, day(2025, 1, 1))]
    #[case(day(2024, 12, 28), RecurringInterval::Weekly, day(2025, 1, 4))]
    fn test_next_calendar_date(
        #[case] from: NaiveDate,
        #[case] interval: RecurringInterval,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(RecurringScheduler::next_calendar_date(from, interval), expected);
    }

    #[test]
    fn test_compute_next_date_keeps_time_of_day() {
        assert_eq!(
            RecurringScheduler::compute_next_date(at(2024, 1, 31), RecurringInterval::Monthly),
            at(2024, 2, 29)
        );
    }

    #[test]
    fn test_compute_next_date_saturates() {
        let max = DateTime::<Utc>::MAX_UTC;
        assert_eq!(
            RecurringScheduler::compute_next_date(max, RecurringInterval::Yearly),
            max
        );
    }

    #[test]
    fn test_plan_nothing_due() {
        let plan =
            RecurringScheduler::plan_catch_up(at(2024, 5, 2), RecurringInterval::Daily, at(2024, 5, 1), 500);
        assert!(plan.occurrences.is_empty());
        assert_eq!(plan.next_occurrence, at(2024, 5, 2));
        assert!(!plan.truncated);
    }

    #[test]
    fn test_plan_catches_up_missed_runs() {
        let plan =
            RecurringScheduler::plan_catch_up(at(2024, 5, 1), RecurringInterval::Daily, at(2024, 5, 4), 500);
        assert_eq!(
            plan.occurrences,
            vec![at(2024, 5, 1), at(2024, 5, 2), at(2024, 5, 3), at(2024, 5, 4)]
        );
        assert_eq!(plan.next_occurrence, at(2024, 5, 5));
        assert!(!plan.truncated);
    }

    #[test]
    fn test_plan_truncates_at_cap() {
        let plan =
            RecurringScheduler::plan_catch_up(at(2024, 1, 1), RecurringInterval::Daily, at(2024, 12, 31), 10);
        assert_eq!(plan.occurrences.len(), 10);
        assert_eq!(plan.next_occurrence, at(2024, 1, 11));
        assert!(plan.truncated);
    }

    #[test]
    fn test_plan_exactly_cap_is_not_truncated() {
        let plan =
            RecurringScheduler::plan_catch_up(at(2024, 1, 1), RecurringInterval::Daily, at(2024, 1, 3), 3);
        assert_eq!(plan.occurrences.len(), 3);
        assert_eq!(plan.next_occurrence, at(2024, 1, 4));
        assert!(!plan.truncated);
    }
}
