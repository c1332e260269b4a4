// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Widget timeline.
//!
//! The widget is a periodic, read-only renderer of the cache store. Each
//! time it wakes up it asks for a [`Timeline`]: one [`Entry`] describing
//! what to show now, and the instant to wake up again. It never migrates,
//! fetches, or writes anything. Whatever the interactive app last cached is
//! what the widget shows.

use crate::{
    credential::CredentialStore,
    model::{CommitHistory, StreakStatistics},
    store::CacheStore,
    streak::calculate_statistics,
};

use chrono::{DateTime, Duration, Local, Utc};
use tracing::{debug, instrument};

/// Minutes between two widget refreshes.
pub const REFRESH_MINUTES: i64 = 30;

/// Hours after which cached data is considered stale.
pub const STALE_AFTER_HOURS: i64 = 24;

/// Hint shown when there is nothing to render.
pub const NO_DATA_MESSAGE: &str = "Open app to load data";

/// Single renderable widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Instant the entry was produced.
    pub date: DateTime<Utc>,
    pub history: Option<CommitHistory>,
    pub statistics: StreakStatistics,
    pub username: Option<String>,

    /// Instant the shown history was fetched.
    pub last_update: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Entry {
    /// Entry shown while the real one is being produced.
    pub fn placeholder(date: DateTime<Utc>) -> Self {
        Self {
            date,
            history: None,
            statistics: StreakStatistics::empty(),
            username: Some("Loading...".into()),
            last_update: None,
            error_message: None,
        }
    }

    /// Entry shown when there is no cached history to render.
    pub fn no_data(date: DateTime<Utc>) -> Self {
        Self {
            date,
            history: None,
            statistics: StreakStatistics::empty(),
            username: None,
            last_update: None,
            error_message: Some(NO_DATA_MESSAGE.into()),
        }
    }

    /// Check if shown history was fetched more than a day before `now`.
    ///
    /// An entry without history is never stale.
    pub fn is_data_stale(&self, now: DateTime<Utc>) -> bool {
        self.last_update
            .is_some_and(|last_update| now - last_update > Duration::hours(STALE_AFTER_HOURS))
    }

    /// Human readable age of shown history, e.g., "3 hours ago".
    pub fn last_update_text(&self, now: DateTime<Utc>) -> String {
        match self.last_update {
            Some(last_update) => relative_time(now - last_update),
            None => "Never updated".into(),
        }
    }
}

/// Entry to render along with the instant of the next refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub entry: Entry,
    pub refresh_at: DateTime<Utc>,
}

/// Produce widget timeline at `now`.
#[instrument(skip(store), level = "debug")]
pub fn timeline<C>(store: &CacheStore<C>, now: DateTime<Local>) -> Timeline
where
    C: CredentialStore,
{
    Timeline {
        entry: load_entry(store, now),
        refresh_at: now.with_timezone(&Utc) + Duration::minutes(REFRESH_MINUTES),
    }
}

/// Produce widget entry of the active account at `now`.
///
/// Falls back to [`Entry::no_data`] whenever settings, an active account,
/// or its history are unavailable.
pub fn load_entry<C>(store: &CacheStore<C>, now: DateTime<Local>) -> Entry
where
    C: CredentialStore,
{
    let date = now.with_timezone(&Utc);
    let settings = match store.peek_app_settings() {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            debug!("no app settings to render");
            return Entry::no_data(date);
        }
        Err(error) => {
            debug!("cannot read app settings: {error}");
            return Entry::no_data(date);
        }
    };

    let Some(account_id) = settings.active_account_id else {
        debug!("no active account to render");
        return Entry::no_data(date);
    };

    let history = match store.load_commit_history(&account_id) {
        Ok(history) => history,
        Err(error) => {
            debug!("cannot read commit history of {account_id:?}: {error}");
            return Entry::no_data(date);
        }
    };

    Entry {
        date,
        statistics: calculate_statistics(&history, &now),
        username: Some(history.username().to_string()),
        last_update: Some(history.last_fetched()),
        history: Some(history),
        error_message: None,
    }
}

fn relative_time(elapsed: Duration) -> String {
    let plural = |count: i64| if count == 1 { "" } else { "s" };

    if elapsed < Duration::minutes(1) {
        "just now".into()
    } else if elapsed < Duration::hours(1) {
        format!("{} min ago", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        let hours = elapsed.num_hours();
        format!("{hours} hour{} ago", plural(hours))
    } else {
        let days = elapsed.num_days();
        format!("{days} day{} ago", plural(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        credential::MemoryCredentials,
        model::CommitDay,
        settings::{AppSettings, GitHubAccount},
    };
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;
    use std::fs;
    use tempfile::TempDir;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
    }

    fn create_test_store() -> (CacheStore<MemoryCredentials>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path(), MemoryCredentials::new());
        (store, temp_dir)
    }

    fn setup_active_account(store: &CacheStore<MemoryCredentials>) -> anyhow::Result<CommitHistory> {
        let mut settings = AppSettings::default();
        settings.add_account(GitHubAccount::new("octocat", Utc::now()))?;
        store.save_app_settings(&settings)?;

        let history = CommitHistory::new(
            "octocat",
            vec![
                CommitDay::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 4),
                CommitDay::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), 1),
            ],
            now().with_timezone(&Utc) - Duration::hours(2),
        );
        store.save_commit_history(&history, "octocat")?;

        Ok(history)
    }

    #[test]
    fn timeline_of_active_account() -> anyhow::Result<()> {
        let (store, _temp) = create_test_store();
        let history = setup_active_account(&store)?;

        let result = timeline(&store, now());
        assert_eq!(result.refresh_at, now().with_timezone(&Utc) + Duration::minutes(30));
        assert_eq!(result.entry.username.as_deref(), Some("octocat"));
        assert_eq!(result.entry.last_update, Some(history.last_fetched()));
        assert_eq!(result.entry.statistics.current_streak, 2);
        assert_eq!(result.entry.history, Some(history));
        assert_eq!(result.entry.error_message, None);
        assert!(!result.entry.is_data_stale(now().with_timezone(&Utc)));

        Ok(())
    }

    #[test]
    fn timeline_without_settings() -> anyhow::Result<()> {
        let (store, temp) = create_test_store();

        let result = timeline(&store, now());
        assert_eq!(result.entry, Entry::no_data(now().with_timezone(&Utc)));
        assert_eq!(result.entry.error_message.as_deref(), Some(NO_DATA_MESSAGE));
        assert_eq!(fs::read_dir(temp.path())?.count(), 0);

        Ok(())
    }

    #[test]
    fn timeline_without_history() -> anyhow::Result<()> {
        let (store, _temp) = create_test_store();
        setup_active_account(&store)?;
        store.remove_account_data("octocat")?;

        let result = timeline(&store, now());
        assert_eq!(result.entry, Entry::no_data(now().with_timezone(&Utc)));

        Ok(())
    }

    #[test]
    fn timeline_never_migrates() -> anyhow::Result<()> {
        let (store, _temp) = create_test_store();
        fs::write(store.legacy_settings_file(), r#"{ "username": "octocat" }"#)?;

        let result = timeline(&store, now());
        assert_eq!(result.entry, Entry::no_data(now().with_timezone(&Utc)));
        assert!(store.legacy_settings_file().exists());
        assert!(!store.app_settings_file().exists());

        Ok(())
    }

    #[test]
    fn data_goes_stale_after_a_day() {
        let fetched = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let entry = Entry {
            last_update: Some(fetched),
            ..Entry::no_data(fetched)
        };

        assert!(!entry.is_data_stale(fetched + Duration::hours(24)));
        assert!(entry.is_data_stale(fetched + Duration::hours(25)));
        assert!(!Entry::placeholder(fetched).is_data_stale(fetched + Duration::days(7)));
    }

    #[test_case(Duration::seconds(30), "just now"; "under a minute")]
    #[test_case(Duration::minutes(5), "5 min ago"; "minutes")]
    #[test_case(Duration::hours(1), "1 hour ago"; "one hour")]
    #[test_case(Duration::hours(3), "3 hours ago"; "hours")]
    #[test_case(Duration::days(2), "2 days ago"; "days")]
    #[test]
    fn last_update_text(elapsed: Duration, expect: &str) {
        let fetched = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let entry = Entry {
            last_update: Some(fetched),
            ..Entry::no_data(fetched)
        };

        pretty_assertions::assert_eq!(entry.last_update_text(fetched + elapsed), expect);
    }
}
