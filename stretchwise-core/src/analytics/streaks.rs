//! Streak calculations over daily aggregates.
//!
//! A streak is a run of consecutive calendar dates that each have at least
//! one completion. A date with no aggregate row counts as zero, so a gap in
//! the rows always breaks a streak. The only exception is today, which may
//! still be empty without ending the current run.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::DailyAggregate;

fn completions_by_date(daily: &[DailyAggregate]) -> BTreeMap<NaiveDate, i64> {
    let mut by_date = BTreeMap::new();
    for row in daily {
        *by_date.entry(row.date).or_insert(0) += row.completed_count;
    }
    by_date
}

/// Consecutive days with a completion, counting back from the most recent
/// active day.
///
/// The run may end today or yesterday; a day with nothing done yet does not
/// break a streak that reached yesterday.
pub fn current_streak(daily: &[DailyAggregate], today: NaiveDate) -> i64 {
    let by_date = completions_by_date(daily);
    let done_on = |day: NaiveDate| by_date.get(&day).copied().unwrap_or(0) > 0;

    let mut day = match today.pred_opt() {
        Some(yesterday) if !done_on(today) => yesterday,
        _ => today,
    };
    let mut streak = 0i64;
    while done_on(day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Longest run of consecutive days with a completion.
pub fn longest_streak(daily: &[DailyAggregate]) -> i64 {
    let mut longest = 0i64;
    let mut current = 0i64;
    let mut prev_date: Option<NaiveDate> = None;

    for (date, completed) in completions_by_date(daily) {
        if completed <= 0 {
            current = 0;
            prev_date = None;
            continue;
        }
        match prev_date {
            Some(prev) if (date - prev).num_days() == 1 => current += 1,
            _ => current = 1,
        }
        longest = longest.max(current);
        prev_date = Some(date);
    }

    longest
}

/// The last `days` dates ending at `today`, oldest first, with zero rows
/// filled in for dates that have no activity.
pub fn recent_days(daily: &[DailyAggregate], today: NaiveDate, days: u32) -> Vec<DailyAggregate> {
    let by_date: BTreeMap<NaiveDate, &DailyAggregate> =
        daily.iter().map(|row| (row.date, row)).collect();

    (0..i64::from(days))
        .rev()
        .filter_map(|offset| today.checked_sub_signed(chrono::Duration::days(offset)))
        .map(|date| {
            by_date
                .get(&date)
                .map(|row| **row)
                .unwrap_or_else(|| DailyAggregate::new(date, 0, 0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 15).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - chrono::Duration::days(n)
    }

    fn row(days: i64, completed: i64) -> DailyAggregate {
        DailyAggregate::new(days_ago(days), completed, 0)
    }

    #[test]
    fn test_current_streak_stops_at_zero() {
        let daily = vec![row(0, 3), row(1, 1), row(2, 0)];
        assert_eq!(current_streak(&daily, today()), 2);
    }

    #[test]
    fn test_current_streak_zero_cases() {
        assert_eq!(current_streak(&[row(0, 0)], today()), 0);
        assert_eq!(current_streak(&[], today()), 0);
        // Last activity two days ago
        assert_eq!(current_streak(&[row(2, 4), row(3, 2)], today()), 0);
        assert_eq!(current_streak(&[row(0, 0), row(2, 1)], today()), 0);
    }

    #[test]
    fn test_current_streak_survives_until_today_is_done() {
        // Nothing today yet, but yesterday and the day before count
        assert_eq!(current_streak(&[row(1, 4), row(2, 2)], today()), 2);
        assert_eq!(current_streak(&[row(0, 0), row(1, 1)], today()), 1);
        assert_eq!(current_streak(&[row(0, 1), row(1, 4), row(2, 2)], today()), 3);
    }

    #[test]
    fn test_current_streak_ignores_row_order() {
        let daily = vec![row(2, 1), row(0, 1), row(1, 2)];
        assert_eq!(current_streak(&daily, today()), 3);
    }

    #[test]
    fn test_missing_date_breaks_streak() {
        // No row at all for yesterday
        let daily = vec![row(0, 2), row(2, 5), row(3, 1)];
        assert_eq!(current_streak(&daily, today()), 1);
    }

    #[test]
    fn test_longest_streak() {
        let daily = vec![
            row(10, 1),
            row(9, 2),
            row(8, 1),
            row(7, 0),
            row(6, 1),
            row(3, 1),
            row(2, 1),
            row(0, 1),
        ];
        assert_eq!(longest_streak(&daily), 3);
        assert_eq!(longest_streak(&[]), 0);
        assert_eq!(longest_streak(&[row(0, 0)]), 0);
    }

    #[test]
    fn test_recent_days_zero_filled() {
        let daily = vec![row(0, 2), row(2, 1), row(30, 9)];
        let recent = recent_days(&daily, today(), 4);

        let dates: Vec<NaiveDate> = recent.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![days_ago(3), days_ago(2), days_ago(1), days_ago(0)]);
        let counts: Vec<i64> = recent.iter().map(|r| r.completed_count).collect();
        assert_eq!(counts, vec![0, 1, 0, 2]);
        assert!(recent_days(&daily, today(), 0).is_empty());
    }
}
