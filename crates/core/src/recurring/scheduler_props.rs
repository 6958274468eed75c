//! Property-based tests for recurring schedule arithmetic.
//!
//! - Next occurrence is always strictly later and keeps the time of day
//! - Monthly steps land in the following month, never skipping one
//! - Catch-up plans are bounded, ordered and leave no due occurrence behind
//!   unless truncated

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use proptest::prelude::*;

use super::interval::RecurringInterval;
use super::scheduler::RecurringScheduler;

fn interval() -> impl Strategy<Value = RecurringInterval> {
    prop_oneof![
        Just(RecurringInterval::Daily),
        Just(RecurringInterval::Weekly),
        Just(RecurringInterval::Monthly),
        Just(RecurringInterval::Yearly),
    ]
}

/// Instants between 1900 and 2100 with arbitrary time of day.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (1900i32..2100, 1u32..=12, 1u32..=31, 0u32..24, 0u32..60).prop_map(|(y, m, d, h, min)| {
        let day = (1..=d)
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(y, m, d))
            .unwrap();
        Utc.from_utc_datetime(&day.and_hms_opt(h, min, 0).unwrap())
    })
}

fn month_index(date: DateTime<Utc>) -> i32 {
    date.year() * 12 + date.month0() as i32
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_next_is_later_same_time(start in instant(), interval in interval()) {
        let next = RecurringScheduler::compute_next_date(start, interval);
        prop_assert!(next > start);
        prop_assert_eq!(next.time(), start.time());
        prop_assert_eq!(next.hour(), start.hour());
    }

    #[test]
    fn prop_monthly_lands_in_next_month(start in instant()) {
        let next = RecurringScheduler::compute_next_date(start, RecurringInterval::Monthly);
        prop_assert_eq!(month_index(next), month_index(start) + 1);
        prop_assert!(next.day() <= start.day());
    }

    #[test]
    fn prop_fixed_steps(start in instant()) {
        prop_assert_eq!(
            RecurringScheduler::compute_next_date(start, RecurringInterval::Daily) - start,
            Duration::days(1)
        );
        prop_assert_eq!(
            RecurringScheduler::compute_next_date(start, RecurringInterval::Weekly) - start,
            Duration::days(7)
        );
    }

    #[test]
    fn prop_catch_up_plan_is_sound(
        start in instant(),
        interval in interval(),
        lag_days in 0i64..4000,
        cap in 0u32..50,
    ) {
        let now = start + Duration::days(lag_days);
        let plan = RecurringScheduler::plan_catch_up(start, interval, now, cap);

        prop_assert!(plan.occurrences.len() <= cap as usize);
        prop_assert!(plan.occurrences.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(plan.occurrences.iter().all(|d| *d <= now));

        if let Some(last) = plan.occurrences.last() {
            prop_assert_eq!(plan.next_occurrence, RecurringScheduler::compute_next_date(*last, interval));
        } else {
            prop_assert_eq!(plan.next_occurrence, start);
        }

        // Untruncated plans leave nothing due; truncated ones always do.
        prop_assert_eq!(plan.truncated, plan.next_occurrence <= now);
    }
}
