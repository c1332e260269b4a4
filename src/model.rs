// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Commit activity domain model.
//!
//! Value types describing a user's daily commit activity, and the aggregate
//! streak statistics derived from it.
//!
//! # Time Zone Policy
//!
//! GitHub reports contributions as date-only strings, so a [`CommitDay`] only
//! ever holds a calendar date. Whenever a timestamp must become a calendar
//! date, e.g., "now" or a legacy timestamp read back from disk, it is
//! converted in the local system time zone first.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{hash_map::Entry, HashMap},
    time::Duration,
};

/// A single day of commit activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDay {
    #[serde(with = "day_format")]
    date: NaiveDate,
    commit_count: u32,
}

impl CommitDay {
    /// Construct new commit day.
    pub fn new(date: NaiveDate, commit_count: u32) -> Self {
        Self { date, commit_count }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn commit_count(&self) -> u32 {
        self.commit_count
    }

    /// Day counts as active when at least one commit was made.
    pub fn has_commits(&self) -> bool {
        self.commit_count > 0
    }
}

/// Complete commit history of a user.
///
/// Days are kept in the order they were fetched. At most one entry exists per
/// calendar date when built through [`CommitHistory::new`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitHistory {
    username: String,
    days: Vec<CommitDay>,
    last_fetched: DateTime<Utc>,
}

impl CommitHistory {
    /// Construct new commit history.
    ///
    /// Entries sharing a calendar date are merged into the position of the
    /// first one, keeping the larger commit count. A repeated date is the same
    /// day reported twice, not additional activity.
    pub fn new(
        username: impl Into<String>,
        days: impl IntoIterator<Item = CommitDay>,
        last_fetched: DateTime<Utc>,
    ) -> Self {
        let mut merged: Vec<CommitDay> = Vec::new();
        let mut positions: HashMap<NaiveDate, usize> = HashMap::new();
        for day in days {
            match positions.entry(day.date) {
                Entry::Occupied(position) => {
                    let seen = &mut merged[*position.get()];
                    seen.commit_count = seen.commit_count.max(day.commit_count);
                }
                Entry::Vacant(position) => {
                    position.insert(merged.len());
                    merged.push(day);
                }
            }
        }

        Self {
            username: username.into(),
            days: merged,
            last_fetched,
        }
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn days(&self) -> &[CommitDay] {
        self.days.as_slice()
    }

    pub fn last_fetched(&self) -> DateTime<Utc> {
        self.last_fetched
    }

    /// Days that fall in the same calendar month and year as `date`.
    pub fn days_in_month(&self, date: NaiveDate) -> Vec<CommitDay> {
        self.days
            .iter()
            .filter(|day| day.date.year() == date.year() && day.date.month() == date.month())
            .copied()
            .collect()
    }

    /// Days between `from` and `to` inclusive.
    pub fn days_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<CommitDay> {
        self.days
            .iter()
            .filter(|day| day.date >= from && day.date <= to)
            .copied()
            .collect()
    }

    /// Days with at least one commit.
    pub fn active_days(&self) -> Vec<CommitDay> {
        self.days.iter().filter(|day| day.has_commits()).copied().collect()
    }

    /// Entry recorded for the calendar date `date`, if any.
    pub fn commits_on(&self, date: NaiveDate) -> Option<&CommitDay> {
        self.days.iter().find(|day| day.date == date)
    }

    /// Number of commits made on `date`, zero if the date is not recorded.
    pub fn commit_count_on(&self, date: NaiveDate) -> u32 {
        self.commits_on(date).map_or(0, CommitDay::commit_count)
    }

    /// Check if history is older than the given refresh interval.
    ///
    /// A history fetched "in the future" relative to `now` never needs a
    /// refresh.
    pub fn needs_refresh(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        match (now - self.last_fetched).to_std() {
            Ok(elapsed) => elapsed > interval,
            Err(_) => false,
        }
    }
}

/// Aggregate statistics about commit streaks and activity.
///
/// The default value is the canonical "empty" statistics used whenever there
/// is no history, or the history has no active days.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreakStatistics {
    /// Consecutive active days ending today or yesterday.
    pub current_streak: u32,

    /// Longest run of consecutive active days anywhere in the history.
    pub longest_streak: u32,

    /// Active days in the current calendar month.
    pub active_days_this_month: u32,

    /// Most recent active day.
    pub last_commit_date: Option<NaiveDate>,
}

impl StreakStatistics {
    /// Statistics of a history without any commits.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

/// Calendar dates stored as `YYYY-MM-DD`.
///
/// The legacy single-account layout stored local midnight as a full
/// timestamp, so RFC 3339 input is accepted as well and mapped back onto the
/// local calendar date.
mod day_format {
    use chrono::{DateTime, Local, NaiveDate};
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub(super) fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(date) = NaiveDate::parse_from_str(&raw, FORMAT) {
            return Ok(date);
        }

        DateTime::parse_from_rfc3339(&raw)
            .map(|stamp| stamp.with_timezone(&Local).date_naive())
            .map_err(DeError::custom)
    }
}
