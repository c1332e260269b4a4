// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Cache store management.
//!
//! Commit-tracker keeps everything it knows on disk in one place called the
//! __cache store__. The interactive app writes to it, and the widget reads
//! from it, without any coordination besides atomic file replacement.
//!
//! # Cache Store Layout
//!
//! The cache store can generally be placed anywhere on the user's file
//! system. However, the default location is the platform data directory,
//! e.g., `$XDG_DATA_HOME/com.github-commit-tracker`. Inside it:
//!
//! ```text
//! app_settings.json                      app-wide settings
//! accounts/<account_id>/commit_history.json
//! user_settings.json                     legacy, migration source only
//! commit_history.json                    legacy, migration source only
//! ```
//!
//! Each account is given its own directory named after its id. Removing an
//! account removes that directory wholesale.
//!
//! # Atomicity
//!
//! Every write serializes the full record into a temporary file next to its
//! target, then renames it over the target. Readers therefore see either the
//! old or the new record, never a torn one. There is no transaction spanning
//! several files.
//!
//! # See Also
//!
//! 1. [`migrate`] for the single-account schema migration.

pub mod migrate;

use crate::{
    credential::{CredentialStore, KeyringCredentials},
    model::CommitHistory,
    path::default_cache_dir,
    settings::AppSettings,
};

use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io,
    path::{Component, Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use tracing::{debug, info, instrument, warn};

pub(crate) const APP_SETTINGS_FILE: &str = "app_settings.json";
pub(crate) const HISTORY_FILE: &str = "commit_history.json";
pub(crate) const LEGACY_SETTINGS_FILE: &str = "user_settings.json";
pub(crate) const ACCOUNTS_DIR: &str = "accounts";

/// Durable storage of settings and per-account commit history.
#[derive(Debug)]
pub struct CacheStore<C = KeyringCredentials>
where
    C: CredentialStore,
{
    root: PathBuf,
    credentials: C,
}

impl CacheStore<KeyringCredentials> {
    /// Open cache store at default location backed by the system keyring.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`](crate::path::NoWayHome) if the platform data
    ///   directory cannot be determined.
    pub fn open_default() -> crate::path::Result<Self> {
        Ok(Self::new(default_cache_dir()?, KeyringCredentials::default()))
    }
}

impl<C> CacheStore<C>
where
    C: CredentialStore,
{
    /// Construct new cache store rooted at `root`.
    ///
    /// Nothing is touched on disk until the first operation. The credential
    /// store only serves the legacy token migration.
    pub fn new(root: impl Into<PathBuf>, credentials: C) -> Self {
        Self {
            root: root.into(),
            credentials,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    /// Save app settings, atomically replacing the previous record.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::FailedToWrite`] if settings cannot be written.
    #[instrument(skip(self, settings), level = "debug")]
    pub fn save_app_settings(&self, settings: &AppSettings) -> Result<()> {
        self.ensure_root()?;
        write_json(&self.app_settings_file(), settings)?;
        debug!("saved app settings with {} account(s)", settings.accounts.len());

        Ok(())
    }

    /// Load app settings.
    ///
    /// Migrates the single-account schema when no app settings have been
    /// saved yet. Loaded settings have their account invariants restored, see
    /// [`AppSettings::reconcile`].
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::FailedToRead`] if settings file cannot be read.
    /// - Return [`Error::CorruptedData`] if settings file cannot be decoded.
    #[instrument(skip(self), level = "debug")]
    pub fn load_app_settings(&self) -> Result<AppSettings> {
        match self.peek_app_settings()? {
            Some(settings) => Ok(settings),
            None => migrate::migrate_legacy_settings(self),
        }
    }

    /// Load app settings without ever migrating.
    ///
    /// Returns `None` if no app settings have been saved yet. Never writes to
    /// disk, so read-only consumers can use it safely.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::FailedToRead`] if settings file cannot be read.
    /// - Return [`Error::CorruptedData`] if settings file cannot be decoded.
    pub fn peek_app_settings(&self) -> Result<Option<AppSettings>> {
        self.check_root()?;
        let path = self.app_settings_file();
        if !path.exists() {
            return Ok(None);
        }

        let mut settings: AppSettings = read_json(&path)?;
        if settings.reconcile() {
            warn!("repaired inconsistent account listing in {}", path.display());
        }

        Ok(Some(settings))
    }

    /// Save commit history of an account, atomically replacing the previous
    /// one.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::InvalidAccountId`] if account id cannot name a
    ///   directory.
    /// - Return [`Error::FailedToWrite`] if history cannot be written.
    #[instrument(skip(self, history), level = "debug")]
    pub fn save_commit_history(&self, history: &CommitHistory, account_id: &str) -> Result<()> {
        let path = self.ensure_account_dir(account_id)?.join(HISTORY_FILE);
        write_json(&path, history)?;
        debug!("saved {} day(s) of history", history.days().len());

        Ok(())
    }

    /// Load commit history of an account.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::InvalidAccountId`] if account id cannot name a
    ///   directory.
    /// - Return [`Error::FailedToRead`] if no history was saved, or it cannot
    ///   be read.
    /// - Return [`Error::CorruptedData`] if history cannot be decoded.
    #[instrument(skip(self), level = "debug")]
    pub fn load_commit_history(&self, account_id: &str) -> Result<CommitHistory> {
        self.check_root()?;
        read_json(&self.account_dir(account_id)?.join(HISTORY_FILE))
    }

    /// Remove all cached data of an account.
    ///
    /// Removing an account without cached data is not an error.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::InvalidAccountId`] if account id cannot name a
    ///   directory.
    /// - Return [`Error::FailedToWrite`] if account directory cannot be
    ///   removed.
    #[instrument(skip(self), level = "debug")]
    pub fn remove_account_data(&self, account_id: &str) -> Result<()> {
        self.check_root()?;
        let path = self.account_dir(account_id)?;
        remove_dir(&path)?;
        info!("removed cached data of account {account_id:?}");

        Ok(())
    }

    /// Clear the entire cache store.
    ///
    /// Removes every account directory, the app settings, and any leftover
    /// legacy files. Failing to remove legacy leftovers is ignored.
    ///
    /// # Errors
    ///
    /// - Return [`Error::InvalidDirectory`] if cache directory is unusable.
    /// - Return [`Error::FailedToWrite`] if account directories or app
    ///   settings cannot be removed.
    #[instrument(skip(self), level = "debug")]
    pub fn clear_all_data(&self) -> Result<()> {
        self.check_root()?;
        remove_dir(&self.accounts_dir())?;
        remove_file(&self.app_settings_file())?;

        for legacy in [self.legacy_history_file(), self.legacy_settings_file()] {
            if let Err(error) = remove_file(&legacy) {
                debug!("leave legacy file behind: {error}");
            }
        }
        info!("cleared cache store at {}", self.root.display());

        Ok(())
    }

    pub(crate) fn app_settings_file(&self) -> PathBuf {
        self.root.join(APP_SETTINGS_FILE)
    }

    pub(crate) fn legacy_settings_file(&self) -> PathBuf {
        self.root.join(LEGACY_SETTINGS_FILE)
    }

    pub(crate) fn legacy_history_file(&self) -> PathBuf {
        self.root.join(HISTORY_FILE)
    }

    fn accounts_dir(&self) -> PathBuf {
        self.root.join(ACCOUNTS_DIR)
    }

    /// Directory of an account.
    ///
    /// # Invariant
    ///
    /// - Account id must be exactly one normal path component, so it can
    ///   never escape the accounts directory.
    fn account_dir(&self, account_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(account_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name.to_str() == Some(account_id) => {
                Ok(self.accounts_dir().join(name))
            }
            _ => Err(Error::InvalidAccountId(account_id.into())),
        }
    }

    /// Verify that cache directory is usable if it exists.
    fn check_root(&self) -> Result<()> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(Error::InvalidDirectory {
                source: io::Error::other("path exists but is not a directory"),
                path: self.root.clone(),
            });
        }

        Ok(())
    }

    fn ensure_root(&self) -> Result<()> {
        self.check_root()?;
        fs::create_dir_all(&self.root).map_err(|source| Error::InvalidDirectory {
            source,
            path: self.root.clone(),
        })
    }

    fn ensure_account_dir(&self, account_id: &str) -> Result<PathBuf> {
        let path = self.account_dir(account_id)?;
        self.ensure_root()?;
        fs::create_dir_all(&path).map_err(|source| Error::FailedToWrite {
            source,
            path: path.clone(),
        })?;

        Ok(path)
    }
}

/// Serialize `value` into `path` through a temporary file and a rename.
fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let failed = |source: io::Error| Error::FailedToWrite {
        source,
        path: path.to_path_buf(),
    };

    let data = serde_json::to_vec_pretty(value).map_err(|error| failed(error.into()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    ));

    // INVARIANT: Never leave a temporary file behind on failure.
    if let Err(error) = fs::write(&tmp_path, &data).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(failed(error));
    }

    Ok(())
}

fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let data = fs::read(path).map_err(|source| Error::FailedToRead {
        source,
        path: path.to_path_buf(),
    })?;

    serde_json::from_slice(&data).map_err(|source| Error::CorruptedData {
        source,
        path: path.to_path_buf(),
    })
}

fn remove_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(Error::FailedToWrite {
            source: error,
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(Error::FailedToWrite {
            source: error,
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

/// All possible error types for cache store interaction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cache directory cannot be created or used.
    #[error("cache directory {:?} is unusable", path.display())]
    InvalidDirectory {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Account id cannot be used as a directory name.
    #[error("account id {0:?} cannot name a cache directory")]
    InvalidAccountId(String),

    /// Data cannot be written to the cache store.
    #[error("failed to write {:?}", path.display())]
    FailedToWrite {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Data cannot be read from the cache store.
    #[error("failed to read {:?}", path.display())]
    FailedToRead {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// Stored data cannot be decoded.
    #[error("corrupted data in {:?}", path.display())]
    CorruptedData {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
}

impl Error {
    /// Check if error stems from a record that was never saved.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::FailedToRead { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Friendly result alias :3
pub type Result<T, E = Error> = std::result::Result<T, E>;
