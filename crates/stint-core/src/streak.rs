//! Consecutive-day focus streak.
//!
//! A calendar date qualifies when at least one focus segment *started*
//! that day (open or closed). The streak counts back from today, with a
//! one-day grace period: a day without activity yet does not break
//! yesterday's streak, but does not extend it either.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};

/// Counts consecutive qualifying days ending at `today` or yesterday.
///
/// - `today` qualifies: count back from `today`.
/// - only yesterday qualifies: count back from yesterday (grace day).
/// - neither qualifies: 0, regardless of earlier activity.
#[must_use]
pub fn current_streak(active_dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if active_dates.contains(&today) {
        today
    } else {
        let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
            return 0;
        };
        if !active_dates.contains(&yesterday) {
            return 0;
        }
        yesterday
    };

    let mut streak = 0;
    let mut cursor = start;
    while active_dates.contains(&cursor) {
        streak += 1;
        match cursor.checked_sub_days(Days::new(1)) {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn dates(days: &[u32]) -> HashSet<NaiveDate> {
        days.iter().map(|&day| date(day)).collect()
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        // Focus on D-2, D-1, D.
        assert_eq!(current_streak(&dates(&[13, 14, 15]), date(15)), 3);
    }

    #[test]
    fn activity_only_two_days_ago_is_broken() {
        // Focus on D-2 only: neither today nor yesterday qualifies.
        assert_eq!(current_streak(&dates(&[13]), date(15)), 0);
    }

    #[test]
    fn yesterday_only_keeps_streak_alive() {
        // Grace day: today has no activity yet, yesterday's streak stands.
        assert_eq!(current_streak(&dates(&[14]), date(15)), 1);
    }

    #[test]
    fn no_activity_at_all() {
        assert_eq!(current_streak(&HashSet::new(), date(15)), 0);
    }

    #[test]
    fn today_only() {
        assert_eq!(current_streak(&dates(&[15]), date(15)), 1);
    }

    #[test]
    fn grace_day_does_not_extend_streak() {
        // Run of 4 ending yesterday reports 4, not 5, while today is empty.
        assert_eq!(current_streak(&dates(&[11, 12, 13, 14]), date(15)), 4);
    }

    #[test]
    fn gap_before_run_stops_the_walk() {
        // 10 qualifies but 13 does not, so the run ending today is 2.
        assert_eq!(current_streak(&dates(&[10, 14, 15]), date(15)), 2);
    }

    #[test]
    fn streak_spans_month_boundary() {
        let days: HashSet<NaiveDate> = [
            NaiveDate::from_ymd_opt(2025, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            current_streak(&days, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()),
            3
        );
    }
}
