//! WeekWindow - ISO 週の区間と締切
//!
//! The scanner reads the clock once per sweep and derives everything from
//! that single reading, so all offerings in one sweep agree on the week.

use std::num::NonZeroU32;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

/// Days after the week start at which a missing log counts as overdue.
pub const OVERDUE_AFTER_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    /// ISO-8601 week number (1..=53).
    pub week_number: u32,
    /// Monday 00:00:00 UTC.
    pub starts_at: DateTime<Utc>,
    /// Sunday 23:59:59.999 UTC.
    pub deadline: DateTime<Utc>,
    /// Whole days elapsed since `starts_at`.
    pub days_since_start: i64,
}

impl WeekWindow {
    /// The ISO week that contains `now`.
    pub fn containing(now: DateTime<Utc>) -> Self {
        let date = now.date_naive();
        let monday =
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let starts_at = monday.and_time(NaiveTime::MIN).and_utc();

        Self::new(
            date.iso_week().week(),
            starts_at,
            (now - starts_at).num_days(),
        )
    }

    /// Explicit window; `deadline` is derived from `starts_at`.
    pub fn new(week_number: u32, starts_at: DateTime<Utc>, days_since_start: i64) -> Self {
        Self {
            week_number,
            starts_at,
            deadline: starts_at + Duration::days(7) - Duration::milliseconds(1),
            days_since_start,
        }
    }

    /// Days overdue, if the missing log should be escalated.
    ///
    /// This compares against the start of the *current* week, so with a real
    /// clock `days_since_start` never exceeds 6 and nothing escalates. Kept
    /// as is until product decides whether escalation should look at the
    /// previous week instead.
    pub fn escalation(&self) -> Option<NonZeroU32> {
        if self.days_since_start <= OVERDUE_AFTER_DAYS {
            return None;
        }
        u32::try_from(self.days_since_start - OVERDUE_AFTER_DAYS)
            .ok()
            .and_then(NonZeroU32::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn midweek_window() {
        // Wednesday of ISO week 2, 2025.
        let now = Utc.with_ymd_and_hms(2025, 1, 8, 12, 30, 0).unwrap();
        let window = WeekWindow::containing(now);

        assert_eq!(window.week_number, 2);
        assert_eq!(window.starts_at, Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap());
        assert_eq!(
            window.deadline,
            Utc.with_ymd_and_hms(2025, 1, 12, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert_eq!(window.days_since_start, 2);
        assert_eq!(window.escalation(), None);
    }

    #[test]
    fn iso_week_one_can_start_in_previous_year() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 8, 0, 0).unwrap();
        let window = WeekWindow::containing(now);

        assert_eq!(window.week_number, 1);
        assert_eq!(window.starts_at, Utc.with_ymd_and_hms(2024, 12, 30, 0, 0, 0).unwrap());
    }

    // 2026 は木曜始まりなので 53 週ある
    #[rstest]
    #[case::monday(Utc.with_ymd_and_hms(2026, 12, 28, 0, 0, 0).unwrap(), 0)]
    #[case::new_years_eve(Utc.with_ymd_and_hms(2026, 12, 31, 18, 0, 0).unwrap(), 3)]
    #[case::next_calendar_year(Utc.with_ymd_and_hms(2027, 1, 3, 23, 0, 0).unwrap(), 6)]
    fn long_year_has_week_53(#[case] now: DateTime<Utc>, #[case] days: i64) {
        let window = WeekWindow::containing(now);

        assert_eq!(window.week_number, 53);
        assert_eq!(window.starts_at, Utc.with_ymd_and_hms(2026, 12, 28, 0, 0, 0).unwrap());
        assert_eq!(window.days_since_start, days);
    }

    #[test]
    fn sunday_night_is_still_inside_the_week() {
        let now = Utc.with_ymd_and_hms(2025, 1, 12, 23, 59, 0).unwrap();
        let window = WeekWindow::containing(now);

        assert_eq!(window.week_number, 2);
        assert_eq!(window.days_since_start, 6);
        assert!(now <= window.deadline);
    }

    #[rstest]
    #[case::first_day(0, None)]
    #[case::at_threshold(7, None)]
    #[case::one_past(8, Some(1))]
    #[case::three_past(10, Some(3))]
    fn escalation_threshold(#[case] days: i64, #[case] expected: Option<u32>) {
        let starts_at = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();
        let window = WeekWindow::new(2, starts_at, days);

        assert_eq!(window.escalation().map(NonZeroU32::get), expected);
    }
}
