// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive app state.
//!
//! The [`Tracker`] is what the interactive app holds on to: the loaded app
//! settings, plus the cache store they came from. It manages accounts,
//! refreshes commit history through a [`ContributionSource`], and derives
//! streak statistics. Presentation polls it; nothing is pushed.

use crate::{
    credential::{CredentialError, CredentialStore, KeyringCredentials, Token},
    github::{fetch_window, ApiError, ContributionSource},
    model::{CommitHistory, StreakStatistics},
    settings::{AppSettings, GitHubAccount, SettingsError},
    store::{self, CacheStore},
    streak::calculate_statistics,
};

use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, instrument, warn};

/// Commit history of an account along with its statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub account: GitHubAccount,
    pub history: CommitHistory,
    pub statistics: StreakStatistics,
}

/// State holder of the interactive app.
#[derive(Debug)]
pub struct Tracker<C = KeyringCredentials>
where
    C: CredentialStore,
{
    store: CacheStore<C>,
    settings: AppSettings,
}

impl<C> Tracker<C>
where
    C: CredentialStore,
{
    /// Load tracker state from cache store.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::Store`] if app settings cannot be loaded.
    pub fn load(store: CacheStore<C>) -> Result<Self> {
        let settings = store.load_app_settings()?;
        debug!("loaded {} account(s)", settings.accounts.len());

        Ok(Self { store, settings })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn store(&self) -> &CacheStore<C> {
        &self.store
    }

    /// Check if user still needs to add a usable account.
    pub fn needs_onboarding(&self) -> bool {
        match self.settings.active_account() {
            Some(account) => !self.store.credentials().exists(&account.id),
            None => true,
        }
    }

    /// Add account owning given token.
    ///
    /// The token is validated first, and must belong to a user that is not
    /// tracked yet. Completes onboarding.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::Api`] if token cannot be validated.
    /// - Return [`TrackerError::Settings`] if account is already tracked.
    /// - Return [`TrackerError::Credential`] if token cannot be stored.
    /// - Return [`TrackerError::Store`] if settings cannot be saved.
    #[instrument(skip(self, source, token), level = "debug")]
    pub async fn add_account<S>(
        &mut self,
        source: &S,
        token: Token,
        now: DateTime<Utc>,
    ) -> Result<GitHubAccount>
    where
        S: ContributionSource,
    {
        let username = source.validate_token(&token).await?;

        // INVARIANT: Reject duplicates before touching the credential store.
        if self.settings.account(&username).is_some() {
            return Err(SettingsError::DuplicateAccount(username).into());
        }

        let account = GitHubAccount::new(username, now);
        let account_id = account.id.clone();
        let mut staged = self.settings.clone();
        staged.add_account(account)?;
        staged.has_completed_onboarding = true;

        self.store.credentials().save(&token, &account_id)?;
        if let Err(error) = self.store.save_app_settings(&staged) {
            if let Err(cleanup) = self.store.credentials().delete(&account_id) {
                warn!("failed to drop token of unsaved account {account_id:?}: {cleanup}");
            }
            return Err(error.into());
        }
        self.settings = staged;
        info!("added account {account_id:?}");

        self.settings
            .account(&account_id)
            .cloned()
            .ok_or(TrackerError::Settings(SettingsError::UnknownAccount(account_id)))
    }

    /// Make account with given id the active one.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::Settings`] if no such account exists.
    /// - Return [`TrackerError::Store`] if settings cannot be saved.
    #[instrument(skip(self), level = "debug")]
    pub fn switch_account(&mut self, account_id: &str) -> Result<()> {
        if self.settings.active_account_id.as_deref() == Some(account_id) {
            return Ok(());
        }

        let mut staged = self.settings.clone();
        staged.switch_account(account_id)?;
        self.store.save_app_settings(&staged)?;
        self.settings = staged;
        info!("switched to account {account_id:?}");

        Ok(())
    }

    /// Remove account along with its token and cached data.
    ///
    /// Another account becomes active if the removed one was. Tracker state
    /// only changes once the updated settings are saved, so a failed removal
    /// can be retried.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::Settings`] if no such account exists.
    /// - Return [`TrackerError::Credential`] if token cannot be deleted.
    /// - Return [`TrackerError::Store`] if cached data cannot be removed, or
    ///   settings cannot be saved.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_account(&mut self, account_id: &str) -> Result<GitHubAccount> {
        let mut staged = self.settings.clone();
        let removed = staged.remove_account(account_id)?;
        self.store.credentials().delete(&removed.id)?;
        self.store.remove_account_data(&removed.id)?;
        self.store.save_app_settings(&staged)?;
        self.settings = staged;
        info!("removed account {:?}", removed.id);

        Ok(removed)
    }

    /// Forget everything: every account's token, all cached data, and all
    /// settings.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::Store`] if cache store cannot be cleared.
    #[instrument(skip(self), level = "debug")]
    pub fn clear_all(&mut self) -> Result<()> {
        for account in &self.settings.accounts {
            if let Err(error) = self.store.credentials().delete(&account.id) {
                warn!("failed to delete token of {:?}: {error}", account.id);
            }
        }

        self.store.clear_all_data()?;
        self.settings = AppSettings::default();
        info!("cleared all accounts and cached data");

        Ok(())
    }

    /// Fetch fresh commit history of the active account.
    ///
    /// Failing to cache the fetched history is logged, the fresh snapshot is
    /// returned regardless.
    ///
    /// # Errors
    ///
    /// - Return [`TrackerError::NoActiveAccount`] if there is no active
    ///   account.
    /// - Return [`TrackerError::Credential`] if its token cannot be loaded.
    /// - Return [`TrackerError::Api`] if contributions cannot be fetched.
    #[instrument(skip(self, source), level = "debug")]
    pub async fn refresh<S>(&self, source: &S, now: DateTime<Local>) -> Result<Snapshot>
    where
        S: ContributionSource,
    {
        let account = self
            .settings
            .active_account()
            .ok_or(TrackerError::NoActiveAccount)?;
        let token = self.store.credentials().load(&account.id)?;

        let fetched_at = now.with_timezone(&Utc);
        let (from, to) = fetch_window(fetched_at);
        let days = source
            .fetch_contributions(&account.username, &token, from, to)
            .await?;
        let history = CommitHistory::new(account.username.clone(), days, fetched_at);
        info!("fetched {} day(s) for {:?}", history.days().len(), account.id);

        if let Err(error) = self.store.save_commit_history(&history, &account.id) {
            warn!("failed to cache commit history: {error}");
        }

        Ok(Snapshot {
            account: account.clone(),
            statistics: calculate_statistics(&history, &now),
            history,
        })
    }

    /// Fetch fresh commit history of the active account only if the cached
    /// one is missing, unreadable, or older than the refresh interval.
    ///
    /// # Errors
    ///
    /// - Return any error of [`Tracker::refresh`] if a refresh is needed.
    pub async fn refresh_if_needed<S>(&self, source: &S, now: DateTime<Local>) -> Result<Snapshot>
    where
        S: ContributionSource,
    {
        match self.cached_snapshot(now) {
            Some(snapshot)
                if !snapshot
                    .history
                    .needs_refresh(now.with_timezone(&Utc), self.settings.refresh_interval) =>
            {
                debug!("cached history is fresh enough");
                Ok(snapshot)
            }
            _ => self.refresh(source, now).await,
        }
    }

    /// Cached commit history of the active account, if any can be read.
    ///
    /// Any failure to read the cache is logged and treated as no data.
    pub fn cached_snapshot(&self, now: DateTime<Local>) -> Option<Snapshot> {
        let account = self.settings.active_account()?;
        match self.store.load_commit_history(&account.id) {
            Ok(history) => Some(Snapshot {
                account: account.clone(),
                statistics: calculate_statistics(&history, &now),
                history,
            }),
            Err(error) => {
                if error.is_missing() {
                    debug!("no cached history for {:?}", account.id);
                } else {
                    warn!("ignoring cached history of {:?}: {error}", account.id);
                }
                None
            }
        }
    }

    /// Streak statistics of the active account from cache only.
    pub fn cached_statistics(&self, now: DateTime<Local>) -> Option<StreakStatistics> {
        self.cached_snapshot(now).map(|snapshot| snapshot.statistics)
    }
}

/// Tracker error types.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Cache store interaction fails.
    #[error(transparent)]
    Store(#[from] store::Error),

    /// Account bookkeeping fails.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Token storage fails.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// GitHub access fails.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// No account is active.
    #[error("no active account, add an account first")]
    NoActiveAccount,
}

/// Friendly result alias :3
type Result<T, E = TrackerError> = std::result::Result<T, E>;
