// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Streak calculation.
//!
//! Derive [`StreakStatistics`] from a [`CommitHistory`]. Everything here is
//! pure: given the same history and the same "now", the same statistics come
//! out.
//!
//! # Streak Semantics
//!
//! An __active day__ is a calendar day with at least one commit. The
//! __current streak__ counts consecutive active days ending today or
//! yesterday. Not having committed yet today does not break a streak, but a
//! full day without commits does. The __longest streak__ is the longest run
//! of consecutive active days anywhere in the history.

use crate::model::{CommitHistory, StreakStatistics};

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};

/// Calculate streak statistics of a commit history.
///
/// The current day is the calendar date of `now` in its own time zone, so
/// callers normally pass [`chrono::Local::now`].
pub fn calculate_statistics<Tz>(history: &CommitHistory, now: &DateTime<Tz>) -> StreakStatistics
where
    Tz: TimeZone,
{
    statistics_on(history, now.date_naive())
}

/// Calculate streak statistics of a commit history as of calendar date `today`.
pub fn statistics_on(history: &CommitHistory, today: NaiveDate) -> StreakStatistics {
    let active = active_dates(history);
    let Some(last) = active.last().copied() else {
        return StreakStatistics::empty();
    };

    StreakStatistics {
        current_streak: current_streak(&active, today),
        longest_streak: longest_streak(&active),
        active_days_this_month: active_days_in_month(&active, today),
        last_commit_date: Some(last),
    }
}

/// Sorted, distinct dates with at least one commit.
///
/// # Invariant
///
/// - Duplicate entries of one date count once, so they can neither extend nor
///   break a streak.
fn active_dates(history: &CommitHistory) -> Vec<NaiveDate> {
    let mut dates = history
        .days()
        .iter()
        .filter(|day| day.has_commits())
        .map(|day| day.date())
        .collect::<Vec<_>>();
    dates.sort_unstable();
    dates.dedup();
    dates
}

fn current_streak(active: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&latest) = active.last() else {
        return 0;
    };

    if latest != today && Some(latest) != previous_day(today) {
        return 0;
    }

    let mut streak = 1;
    let mut cursor = latest;
    for &date in active.iter().rev().skip(1) {
        if Some(date) != previous_day(cursor) {
            break;
        }
        streak += 1;
        cursor = date;
    }

    streak
}

fn longest_streak(active: &[NaiveDate]) -> u32 {
    if active.is_empty() {
        return 0;
    }

    let mut longest = 1;
    let mut running = 1;
    for pair in active.windows(2) {
        if Some(pair[1]) == next_day(pair[0]) {
            running += 1;
            longest = longest.max(running);
        } else {
            running = 1;
        }
    }

    longest
}

fn active_days_in_month(active: &[NaiveDate], today: NaiveDate) -> u32 {
    active
        .iter()
        .filter(|date| date.year() == today.year() && date.month() == today.month())
        .count() as u32
}

fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}

fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitDay;
    use chrono::{Local, Utc};
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(days: &[(NaiveDate, u32)]) -> CommitHistory {
        CommitHistory::new(
            "octocat",
            days.iter().map(|(date, count)| CommitDay::new(*date, *count)),
            Utc::now(),
        )
    }

    fn active_history(today: NaiveDate, offsets: &[u64]) -> CommitHistory {
        let days = offsets
            .iter()
            .map(|offset| (today - Days::new(*offset), 1))
            .collect::<Vec<_>>();
        history(&days)
    }

    #[test_case(&[3, 2], 0; "gap of a full day breaks streak")]
    #[test_case(&[1, 0], 2; "yesterday and today")]
    #[test_case(&[1], 1; "yesterday only")]
    #[test_case(&[0], 1; "today only")]
    #[test_case(&[2], 0; "day before yesterday only")]
    #[test_case(&[0, 1, 2, 4, 5], 3; "stops at first gap")]
    #[test]
    fn current_streak_recency(offsets: &[u64], expect: u32) {
        let today = day(2024, 3, 15);
        let stats = statistics_on(&active_history(today, offsets), today);
        pretty_assertions::assert_eq!(stats.current_streak, expect);
        assert!(stats.longest_streak >= stats.current_streak);
    }

    #[test]
    fn empty_history_yields_empty_statistics() {
        let today = day(2024, 3, 15);

        let result = statistics_on(&history(&[]), today);
        assert_eq!(result, StreakStatistics::empty());

        let result = statistics_on(&history(&[(day(2024, 3, 14), 0), (today, 0)]), today);
        assert_eq!(result, StreakStatistics::empty());
    }

    #[test]
    fn longest_streak_across_gap() {
        let stats = statistics_on(
            &history(&[
                (day(2024, 1, 1), 1),
                (day(2024, 1, 2), 3),
                (day(2024, 1, 3), 2),
                (day(2024, 1, 7), 1),
                (day(2024, 1, 8), 4),
            ]),
            day(2024, 1, 20),
        );

        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn longest_streak_unsorted_input() {
        let stats = statistics_on(
            &history(&[
                (day(2024, 1, 8), 1),
                (day(2024, 1, 1), 1),
                (day(2024, 1, 7), 1),
                (day(2024, 1, 9), 1),
            ]),
            day(2024, 1, 9),
        );

        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.last_commit_date, Some(day(2024, 1, 9)));
    }

    #[test]
    fn single_active_day() {
        let only = history(&[(day(2024, 5, 10), 2)]);

        let recent = statistics_on(&only, day(2024, 5, 11));
        assert_eq!((recent.current_streak, recent.longest_streak), (1, 1));

        let stale = statistics_on(&only, day(2024, 5, 20));
        assert_eq!((stale.current_streak, stale.longest_streak), (0, 1));
    }

    #[test]
    fn active_days_this_month_spans_months() {
        let stats = statistics_on(
            &history(&[
                (day(2023, 2, 10), 1),
                (day(2024, 1, 30), 1),
                (day(2024, 1, 31), 1),
                (day(2024, 2, 1), 1),
                (day(2024, 2, 2), 0),
                (day(2024, 2, 5), 6),
            ]),
            day(2024, 2, 6),
        );

        assert_eq!(stats.active_days_this_month, 2);
    }

    #[test]
    fn duplicate_dates_count_once() {
        let today = day(2024, 3, 15);
        let raw: CommitHistory = serde_json::from_str(
            r#"{
                "username": "octocat",
                "days": [
                    { "date": "2024-03-13", "commitCount": 1 },
                    { "date": "2024-03-14", "commitCount": 1 },
                    { "date": "2024-03-14", "commitCount": 2 },
                    { "date": "2024-03-15", "commitCount": 1 }
                ],
                "lastFetched": "2024-03-15T12:00:00Z"
            }"#,
        )
        .unwrap();

        let stats = statistics_on(&raw, today);
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.active_days_this_month, 3);
    }

    #[test]
    fn new_year_boundary() {
        let stats = statistics_on(
            &history(&[(day(2023, 12, 30), 1), (day(2023, 12, 31), 1), (day(2024, 1, 1), 1)]),
            day(2024, 1, 1),
        );

        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.active_days_this_month, 1);
    }

    #[test]
    fn commit_tracker_scenario() {
        let now = Local.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        let stats = calculate_statistics(
            &history(&[(day(2024, 1, 1), 2), (day(2024, 1, 2), 0), (day(2024, 1, 3), 1)]),
            &now,
        );

        let expect = StreakStatistics {
            current_streak: 1,
            longest_streak: 1,
            active_days_this_month: 2,
            last_commit_date: Some(day(2024, 1, 3)),
        };
        assert_eq!(stats, expect);
    }
}
