// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the optional configuration file of commit-tracker.
//! Every field has a sensible default, so a missing file, or a file only
//! setting some fields, is perfectly fine.
//!
//! # General Layout
//!
//! ```toml
//! [store]
//! cache_dir = "$XDG_DATA_HOME/com.github-commit-tracker"
//!
//! [keyring]
//! service = "com.github-commit-tracker"
//! ```
//!
//! The cache directory undergoes shell expansion, so environment variables
//! and `~` can be used freely.

use crate::{
    credential::KeyringCredentials,
    path::{default_cache_dir, APP_ID},
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Commit-tracker configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Settings for the cache store.
    pub store: StoreSettings,

    /// Settings for the token keyring.
    pub keyring: KeyringSettings,
}

impl TrackerConfig {
    /// Load configuration file at `path`.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file exists but cannot be read.
    /// - Return any error of [`TrackerConfig::from_str`] if file contents are
    ///   invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(data) => data.parse(),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no configuration at {}, use defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                source,
                path: path.into(),
            }),
        }
    }

    /// Resolve cache directory, falling back to the default location.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`](crate::path::NoWayHome) if no cache directory
    ///   is configured and the default one cannot be determined.
    pub fn cache_dir(&self) -> crate::path::Result<PathBuf> {
        match &self.store.cache_dir {
            Some(cache_dir) => Ok(cache_dir.as_path().into()),
            None => default_cache_dir(),
        }
    }

    /// Construct keyring credential store for configured service.
    pub fn credentials(&self) -> KeyringCredentials {
        KeyringCredentials::new(self.keyring.service.as_str())
    }
}

impl FromStr for TrackerConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: TrackerConfig = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on cache directory field.
        if let Some(cache_dir) = config.store.cache_dir.take() {
            config.store.cache_dir = Some(CacheDir::new(
                shellexpand::full(cache_dir.to_string().as_str())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(config)
    }
}

impl Display for TrackerConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Cache store settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding the cache store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<CacheDir>,
}

/// Token keyring settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyringSettings {
    /// Service name tokens are stored under.
    pub service: String,
}

impl Default for KeyringSettings {
    fn default() -> Self {
        Self {
            service: APP_ID.into(),
        }
    }
}

/// Path to directory holding the cache store.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct CacheDir(PathBuf);

impl CacheDir {
    /// Construct new cache directory path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Treat cache directory as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }
}

impl Display for CacheDir {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to read configuration file.
    #[error("failed to read configuration file {:?}", path.display())]
    Read {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
