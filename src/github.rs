// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub contribution source.
//!
//! Commit-tracker does not talk to GitHub itself. Hosts plug in a
//! [`ContributionSource`], typically a GraphQL client, and the
//! [`Tracker`](crate::tracker::Tracker) drives it. Retry and backoff policy
//! belongs to the source, not to commit-tracker.

use crate::{credential::Token, model::CommitDay};

use chrono::{DateTime, Days, Utc};
use std::future::Future;

/// Number of days of contributions fetched per refresh.
pub const FETCH_WINDOW_DAYS: u64 = 365;

/// Layer of indirection for GitHub access.
pub trait ContributionSource {
    /// Validate access token, returning the login name it belongs to.
    fn validate_token(&self, token: &Token) -> impl Future<Output = Result<String>> + Send;

    /// Fetch daily contribution counts of a user between `from` and `to`.
    fn fetch_contributions(
        &self,
        username: &str,
        token: &Token,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<CommitDay>>> + Send;
}

/// Time span covered by a refresh ending at `now`.
pub fn fetch_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = now
        .checked_sub_days(Days::new(FETCH_WINDOW_DAYS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    (from, now)
}

/// GitHub access error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Token was rejected while fetching.
    #[error("invalid GitHub token, update your token")]
    Unauthorized,

    /// Rate limit exhausted.
    #[error("rate limited by GitHub")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// GitHub answered with an unexpected status.
    #[error("GitHub server error: {0}")]
    Server(u16),

    /// Response could not be understood.
    #[error("invalid response from GitHub")]
    InvalidResponse,

    /// Token was rejected while validating it.
    #[error("invalid GitHub token")]
    InvalidToken,

    /// No such user on GitHub.
    #[error("user not found on GitHub")]
    UnknownUser,
}

/// Friendly result alias :3
pub type Result<T, E = ApiError> = std::result::Result<T, E>;
