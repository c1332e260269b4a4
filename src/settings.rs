// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Application settings layout.
//!
//! Specify the layout of the settings record shared by the interactive app
//! and the widget, along with the account bookkeeping that keeps it
//! consistent. File I/O is left to [`CacheStore`](crate::store::CacheStore).
//!
//! # Accounts
//!
//! An __account__ is one tracked GitHub identity. Accounts are keyed by their
//! username, which doubles as the key of their credential and of their commit
//! history partition in the cache store. At most one account is active at a
//! time, and whenever accounts exist, one of them should be.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Refresh interval used when none was configured, three hours.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3 * 3600);

/// A tracked GitHub account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubAccount {
    /// Identity key, always equal to the username.
    pub id: String,

    /// GitHub login name.
    pub username: String,

    /// Optional human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// When the account was added.
    pub date_added: DateTime<Utc>,

    /// Whether this account is the active one.
    pub is_active: bool,
}

impl GitHubAccount {
    /// Construct new inactive account for given username.
    pub fn new(username: impl Into<String>, date_added: DateTime<Utc>) -> Self {
        let username = username.into();
        Self {
            id: username.clone(),
            username,
            display_name: None,
            date_added,
            is_active: false,
        }
    }

    /// Name to show for this account.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.username.as_str())
    }
}

/// Appearance preference of the interactive app.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppearanceMode {
    Light,
    Dark,
    #[default]
    System,
}

/// App-wide settings.
///
/// # Invariant
///
/// - No two accounts share an id.
/// - If accounts exist, `active_account_id` names one of them, and that
///   account is the only one flagged active.
///
/// Mutate accounts through the methods below to keep these invariants. A
/// record decoded from disk is brought back in line by
/// [`AppSettings::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub accounts: Vec<GitHubAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_account_id: Option<String>,

    pub appearance_mode: AppearanceMode,

    pub has_completed_onboarding: bool,

    #[serde(with = "seconds")]
    pub refresh_interval: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            active_account_id: None,
            appearance_mode: AppearanceMode::default(),
            has_completed_onboarding: false,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl AppSettings {
    pub fn has_accounts(&self) -> bool {
        !self.accounts.is_empty()
    }

    /// Lookup account by id.
    pub fn account(&self, id: &str) -> Option<&GitHubAccount> {
        self.accounts.iter().find(|account| account.id == id)
    }

    /// Currently active account, if any.
    pub fn active_account(&self) -> Option<&GitHubAccount> {
        self.active_account_id
            .as_deref()
            .and_then(|id| self.account(id))
    }

    /// Add new account.
    ///
    /// The first account added to settings without an active account becomes
    /// active.
    ///
    /// # Errors
    ///
    /// - Return [`SettingsError::DuplicateAccount`] if an account with the
    ///   same id is already tracked.
    pub fn add_account(&mut self, mut account: GitHubAccount) -> Result<()> {
        if self.account(&account.id).is_some() {
            return Err(SettingsError::DuplicateAccount(account.id));
        }

        account.is_active = false;
        let id = account.id.clone();
        self.accounts.push(account);

        if self.active_account().is_none() {
            self.set_active(Some(id));
        }

        Ok(())
    }

    /// Make account with given id the active one.
    ///
    /// # Errors
    ///
    /// - Return [`SettingsError::UnknownAccount`] if no such account exists.
    pub fn switch_account(&mut self, id: &str) -> Result<()> {
        if self.account(id).is_none() {
            return Err(SettingsError::UnknownAccount(id.into()));
        }

        self.set_active(Some(id.into()));
        Ok(())
    }

    /// Remove account with given id.
    ///
    /// If the removed account was active, then the first remaining account
    /// takes its place. Active account is cleared once no accounts remain.
    ///
    /// # Errors
    ///
    /// - Return [`SettingsError::UnknownAccount`] if no such account exists.
    pub fn remove_account(&mut self, id: &str) -> Result<GitHubAccount> {
        let index = self
            .accounts
            .iter()
            .position(|account| account.id == id)
            .ok_or_else(|| SettingsError::UnknownAccount(id.into()))?;
        let removed = self.accounts.remove(index);

        if self.active_account().is_none() {
            let next = self.accounts.first().map(|account| account.id.clone());
            self.set_active(next);
        }

        Ok(removed)
    }

    /// Restore account invariants.
    ///
    /// Drops accounts with duplicate ids (first one wins), repoints a missing
    /// or dangling active account id at the first account, and syncs every
    /// account's active flag. Returns true if anything changed.
    pub fn reconcile(&mut self) -> bool {
        let before = self.clone();

        let mut seen = Vec::with_capacity(self.accounts.len());
        self.accounts.retain(|account| {
            if seen.contains(&account.id) {
                return false;
            }
            seen.push(account.id.clone());
            true
        });

        let active = match self.active_account() {
            Some(account) => Some(account.id.clone()),
            None => self.accounts.first().map(|account| account.id.clone()),
        };
        self.set_active(active);

        *self != before
    }

    fn set_active(&mut self, id: Option<String>) {
        for account in &mut self.accounts {
            account.is_active = id.as_deref() == Some(account.id.as_str());
        }
        self.active_account_id = id;
    }
}

/// Settings layout of the single-account schema.
///
/// Only ever read by the cache store migration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserSettings {
    pub username: Option<String>,
    pub has_completed_onboarding: bool,
    pub last_refresh_date: Option<DateTime<Utc>>,
    #[serde(with = "seconds")]
    pub refresh_interval: Duration,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            username: None,
            has_completed_onboarding: false,
            last_refresh_date: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// Account bookkeeping error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Account is already tracked.
    #[error("account {0:?} has already been added")]
    DuplicateAccount(String),

    /// Account is not tracked.
    #[error("no account named {0:?}")]
    UnknownAccount(String),
}

/// Friendly result alias :3
type Result<T, E = SettingsError> = std::result::Result<T, E>;

/// Durations stored as fractional seconds.
mod seconds {
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(DeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn added() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn settings_with(names: &[&str]) -> AppSettings {
        let mut settings = AppSettings::default();
        for name in names {
            settings.add_account(GitHubAccount::new(*name, added())).unwrap();
        }
        settings
    }

    fn active_flags(settings: &AppSettings) -> Vec<(&str, bool)> {
        settings
            .accounts
            .iter()
            .map(|account| (account.id.as_str(), account.is_active))
            .collect()
    }

    #[test]
    fn first_added_account_becomes_active() {
        let settings = settings_with(&["octocat", "hubot"]);

        assert_eq!(settings.active_account_id.as_deref(), Some("octocat"));
        assert_eq!(active_flags(&settings), vec![("octocat", true), ("hubot", false)]);
    }

    #[test]
    fn add_account_rejects_duplicate() {
        let mut settings = settings_with(&["octocat"]);

        let result = settings.add_account(GitHubAccount::new("octocat", added()));
        assert_eq!(result, Err(SettingsError::DuplicateAccount("octocat".into())));
        assert_eq!(settings.accounts.len(), 1);
    }

    #[test]
    fn switch_account() {
        let mut settings = settings_with(&["octocat", "hubot"]);

        settings.switch_account("hubot").unwrap();
        assert_eq!(settings.active_account().map(|a| a.id.as_str()), Some("hubot"));
        assert_eq!(active_flags(&settings), vec![("octocat", false), ("hubot", true)]);

        let result = settings.switch_account("ghost");
        assert_eq!(result, Err(SettingsError::UnknownAccount("ghost".into())));
        assert_eq!(settings.active_account_id.as_deref(), Some("hubot"));
    }

    #[test]
    fn remove_active_account_reassigns_active() {
        let mut settings = settings_with(&["octocat", "hubot", "monalisa"]);

        let removed = settings.remove_account("octocat").unwrap();
        assert_eq!(removed.id, "octocat");

        let active = settings.active_account_id.clone().unwrap();
        assert_ne!(active, "octocat");
        assert!(settings.account(&active).is_some());
        assert_eq!(active_flags(&settings), vec![("hubot", true), ("monalisa", false)]);
    }

    #[test]
    fn remove_inactive_account_keeps_active() {
        let mut settings = settings_with(&["octocat", "hubot"]);

        settings.remove_account("hubot").unwrap();
        assert_eq!(settings.active_account_id.as_deref(), Some("octocat"));
    }

    #[test]
    fn remove_last_account_clears_active() {
        let mut settings = settings_with(&["octocat"]);

        settings.remove_account("octocat").unwrap();
        assert!(!settings.has_accounts());
        assert_eq!(settings.active_account_id, None);

        let result = settings.remove_account("octocat");
        assert_eq!(result, Err(SettingsError::UnknownAccount("octocat".into())));
    }

    #[test]
    fn reconcile_repairs_dangling_active_account() {
        let mut settings = settings_with(&["octocat", "hubot"]);
        settings.accounts.push(GitHubAccount::new("octocat", added()));
        settings.active_account_id = Some("ghost".into());
        settings.accounts[1].is_active = true;

        assert!(settings.reconcile());
        assert_eq!(settings.active_account_id.as_deref(), Some("octocat"));
        assert_eq!(active_flags(&settings), vec![("octocat", true), ("hubot", false)]);

        assert!(!settings.reconcile());
    }

    #[test]
    fn reconcile_without_accounts() {
        let mut settings = AppSettings {
            active_account_id: Some("ghost".into()),
            ..AppSettings::default()
        };

        assert!(settings.reconcile());
        assert_eq!(settings.active_account_id, None);
    }

    #[test]
    fn serialize_app_settings() -> anyhow::Result<()> {
        let result = serde_json::to_string_pretty(&settings_with(&["octocat"]))?;
        let expect = indoc! {r#"
            {
              "accounts": [
                {
                  "id": "octocat",
                  "username": "octocat",
                  "dateAdded": "2024-01-01T09:00:00Z",
                  "isActive": true
                }
              ],
              "activeAccountId": "octocat",
              "appearanceMode": "system",
              "hasCompletedOnboarding": false,
              "refreshInterval": 10800.0
            }"#};
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_legacy_user_settings() -> anyhow::Result<()> {
        let result: UserSettings = serde_json::from_str(indoc! {r#"
            {
              "username": "octocat",
              "hasCompletedOnboarding": true,
              "lastRefreshDate": "2024-01-02T10:00:00Z",
              "refreshInterval": 3600
            }
        "#})?;

        let expect = UserSettings {
            username: Some("octocat".into()),
            has_completed_onboarding: true,
            last_refresh_date: Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()),
            refresh_interval: Duration::from_secs(3600),
        };
        assert_eq!(result, expect);

        let result: UserSettings = serde_json::from_str("{}")?;
        assert_eq!(result, UserSettings::default());

        Ok(())
    }
}
