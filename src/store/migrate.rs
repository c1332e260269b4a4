// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Single-account schema migration.
//!
//! Before multiple accounts were supported, the cache store held one
//! `user_settings.json`, one `commit_history.json` at its top level, and the
//! credential store held one token under a fixed key. The first time app
//! settings are loaded and none exist yet, this layout is translated into
//! the per-account layout:
//!
//! 1. The legacy username becomes the one and only, active, account.
//! 2. The legacy commit history moves into that account's directory.
//! 3. The legacy token is copied to that account's credential. The legacy
//!    token itself is left in place.
//! 4. The new app settings are saved, and the legacy settings file removed.
//!
//! Migration never fails because of legacy data. Anything that cannot be
//! migrated is logged and skipped, so the user at worst has to add their
//! account again.

use crate::{
    credential::{CredentialError, CredentialStore},
    model::CommitHistory,
    settings::{AppSettings, GitHubAccount, UserSettings},
    store::{read_json, CacheStore, Result},
};

use chrono::Utc;
use std::fs;
use tracing::{debug, info, instrument, warn};

/// Migrate legacy settings into app settings.
///
/// Returns default app settings if there is nothing to migrate, or if the
/// legacy settings cannot be read. Once migrated, app settings exist and
/// later loads never reach this point again.
///
/// # Errors
///
/// - Return [`Error::InvalidDirectory`](crate::store::Error::InvalidDirectory)
///   if cache directory is unusable.
#[instrument(skip(store), level = "debug")]
pub fn migrate_legacy_settings<C>(store: &CacheStore<C>) -> Result<AppSettings>
where
    C: CredentialStore,
{
    store.check_root()?;
    let mut settings = AppSettings::default();

    let legacy_path = store.legacy_settings_file();
    if !legacy_path.exists() {
        debug!("no legacy settings to migrate");
        return Ok(settings);
    }

    info!("migrate legacy settings at {}", legacy_path.display());
    let legacy: UserSettings = match read_json(&legacy_path) {
        Ok(legacy) => legacy,
        Err(error) => {
            warn!("failed to load legacy settings: {error}");
            return Ok(settings);
        }
    };

    if let Some(username) = legacy.username {
        let mut account = GitHubAccount::new(
            username,
            legacy.last_refresh_date.unwrap_or_else(Utc::now),
        );
        account.is_active = true;
        let account_id = account.id.clone();

        settings.accounts = vec![account];
        settings.active_account_id = Some(account_id.clone());
        settings.has_completed_onboarding = legacy.has_completed_onboarding;
        settings.refresh_interval = legacy.refresh_interval;

        migrate_history(store, &account_id);
        migrate_token(store.credentials(), &account_id);
    }

    match store.save_app_settings(&settings) {
        Ok(()) => {
            if let Err(error) = fs::remove_file(&legacy_path) {
                warn!("failed to remove legacy settings: {error}");
            }
            info!("migrated {} account(s)", settings.accounts.len());
        }
        // INVARIANT: Keep legacy settings around so the next load retries.
        Err(error) => warn!("failed to save migrated settings: {error}"),
    }

    Ok(settings)
}

fn migrate_history<C>(store: &CacheStore<C>, account_id: &str)
where
    C: CredentialStore,
{
    let legacy_path = store.legacy_history_file();
    if !legacy_path.exists() {
        debug!("no legacy commit history to migrate");
        return;
    }

    let migrated = read_json::<CommitHistory>(&legacy_path)
        .and_then(|history| store.save_commit_history(&history, account_id));
    match migrated {
        Ok(()) => {
            info!("moved legacy commit history to account {account_id:?}");
            if let Err(error) = fs::remove_file(&legacy_path) {
                debug!("leave legacy commit history behind: {error}");
            }
        }
        Err(error) => warn!("failed to migrate commit history: {error}"),
    }
}

fn migrate_token<C>(credentials: &C, account_id: &str)
where
    C: CredentialStore,
{
    let token = match credentials.load_legacy() {
        Ok(token) => token,
        Err(CredentialError::NotFound) => {
            debug!("no legacy token to migrate");
            return;
        }
        Err(error) => {
            warn!("failed to load legacy token: {error}");
            return;
        }
    };

    match credentials.save(&token, account_id) {
        Ok(()) => info!("copied legacy token to account {account_id:?}"),
        Err(error) => warn!("failed to migrate legacy token: {error}"),
    }
}
