// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations of the files that commit-tracker reads and
//! writes on behalf of the user.

use std::path::PathBuf;

/// Application identifier used to scope on-disk data and keyring entries.
pub const APP_ID: &str = "com.github-commit-tracker";

/// Determine default absolute path to the cache directory.
///
/// Uses the platform data directory, i.e., `$XDG_DATA_HOME` on Linux and
/// `~/Library/Application Support` on macOS, joined with [`APP_ID`]. Does
/// not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if the data directory cannot be determined.
pub fn default_cache_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join(APP_ID))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the configuration file.
///
/// Uses `$XDG_CONFIG_HOME/commit-tracker/config.toml`. Does not check if the
/// path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if the configuration directory cannot be
///   determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("commit-tracker").join("config.toml"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::data_dir`](https://docs.rs/dirs/latest/dirs/fn.data_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's data directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
