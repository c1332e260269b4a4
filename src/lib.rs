// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local cache and streak statistics engine of a GitHub commit tracker.
//!
//! Commit-tracker keeps the daily commit activity of one or more GitHub
//! accounts on disk, and derives streak statistics from it. Two consumers
//! share the same on-disk [cache store](store): the interactive app through
//! [`Tracker`](tracker::Tracker), and a read-only, periodically refreshed
//! [widget](widget).
//!
//! Talking to GitHub itself is left to the host through
//! [`ContributionSource`](github::ContributionSource).

pub mod config;
pub mod credential;
pub mod github;
pub mod model;
pub mod path;
pub mod settings;
pub mod store;
pub mod streak;
pub mod tracker;
pub mod widget;

pub use credential::{CredentialStore, KeyringCredentials, MemoryCredentials, Token};
pub use model::{CommitDay, CommitHistory, StreakStatistics};
pub use settings::{AppSettings, GitHubAccount};
pub use store::CacheStore;
pub use streak::calculate_statistics;
pub use tracker::Tracker;
