// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use commit_tracker::{
    config::TrackerConfig,
    path::default_config_file,
    store::CacheStore,
    tracker::Tracker,
    widget::{self, Entry},
};

use anyhow::{bail, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const NO_ACCOUNTS_HINT: &str =
    "no accounts yet, accounts are added by the host app embedding commit-tracker";

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "commit-tracker [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to cache directory, overriding configuration file.
    #[arg(long, global = true, value_name = "path")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => TrackerConfig::load(path)?,
            None => TrackerConfig::load(default_config_file()?)?,
        };
        let cache_dir = match self.cache_dir {
            Some(cache_dir) => cache_dir,
            None => config.cache_dir()?,
        };
        let tracker = Tracker::load(CacheStore::new(cache_dir, config.credentials()))?;

        match self.command {
            Command::Status => run_status(tracker),
            Command::Accounts => run_accounts(tracker),
            Command::Switch(opts) => run_switch(tracker, opts),
            Command::Remove(opts) => run_remove(tracker, opts),
            Command::Clear(opts) => run_clear(tracker, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Show cached streak statistics of active account.
    #[command(override_usage = "commit-tracker status [options]")]
    Status,

    /// List tracked accounts.
    #[command(override_usage = "commit-tracker accounts [options]")]
    Accounts,

    /// Make another account the active one.
    #[command(override_usage = "commit-tracker switch [options] <account>")]
    Switch(SwitchOptions),

    /// Remove accounts along with their tokens and cached data.
    #[command(override_usage = "commit-tracker remove [options] <account>...")]
    Remove(RemoveOptions),

    /// Remove all accounts, tokens, and cached data.
    #[command(override_usage = "commit-tracker clear [options] --yes")]
    Clear(ClearOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SwitchOptions {
    /// Id of account to make active.
    #[arg(required = true, value_name = "account")]
    pub account: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RemoveOptions {
    /// Ids of accounts to remove.
    #[arg(required = true, value_name = "account")]
    pub accounts: Vec<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ClearOptions {
    /// Confirm removal of everything.
    #[arg(short, long)]
    pub yes: bool,
}

fn main() {
    let layer = fmt::layer().compact().with_target(false).without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_status(tracker: Tracker) -> Result<()> {
    let Some(account) = tracker.settings().active_account() else {
        info!("{NO_ACCOUNTS_HINT}");
        return Ok(());
    };

    let now = Local::now();
    let entry = widget::load_entry(tracker.store(), now);
    for line in status_lines(account.label(), &entry, now.with_timezone(&Utc)) {
        println!("{line}");
    }

    Ok(())
}

fn status_lines(label: &str, entry: &Entry, now: DateTime<Utc>) -> Vec<String> {
    if let Some(message) = &entry.error_message {
        return vec![format!("{label}: {message}")];
    }

    let stats = entry.statistics;
    let last_commit = match stats.last_commit_date {
        Some(date) => date.to_string(),
        None => "never".into(),
    };
    let mut lines = vec![
        format!("account:           {label}"),
        format!("current streak:    {} day(s)", stats.current_streak),
        format!("longest streak:    {} day(s)", stats.longest_streak),
        format!("active this month: {} day(s)", stats.active_days_this_month),
        format!("last commit:       {last_commit}"),
        format!("last updated:      {}", entry.last_update_text(now)),
    ];
    if entry.is_data_stale(now) {
        lines.push("cached data is stale, refresh it from the host app".into());
    }

    lines
}

fn run_accounts(tracker: Tracker) -> Result<()> {
    if !tracker.settings().has_accounts() {
        info!("{NO_ACCOUNTS_HINT}");
        return Ok(());
    }

    for account in &tracker.settings().accounts {
        let marker = if account.is_active { "*" } else { " " };
        println!("{marker} {} (added {})", account.label(), account.date_added.date_naive());
    }

    Ok(())
}

fn run_switch(mut tracker: Tracker, opts: SwitchOptions) -> Result<()> {
    tracker.switch_account(&opts.account)?;
    Ok(())
}

fn run_remove(mut tracker: Tracker, opts: RemoveOptions) -> Result<()> {
    for account in opts.accounts {
        tracker.remove_account(&account)?;
    }

    Ok(())
}

fn run_clear(mut tracker: Tracker, opts: ClearOptions) -> Result<()> {
    if !opts.yes {
        bail!("refusing to clear everything without --yes");
    }

    tracker.clear_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use commit_tracker::{CommitDay, CommitHistory, StreakStatistics};
    use pretty_assertions::assert_eq;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap()
    }

    fn entry() -> Entry {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        Entry {
            date: fetched(),
            history: Some(CommitHistory::new("octocat", [CommitDay::new(day, 1)], fetched())),
            statistics: StreakStatistics {
                current_streak: 1,
                longest_streak: 4,
                active_days_this_month: 2,
                last_commit_date: Some(day),
            },
            username: Some("octocat".into()),
            last_update: Some(fetched()),
            error_message: None,
        }
    }

    #[test]
    fn status_of_fresh_entry() {
        let result = status_lines("octocat", &entry(), fetched() + Duration::hours(3));
        let expect = vec![
            "account:           octocat",
            "current streak:    1 day(s)",
            "longest streak:    4 day(s)",
            "active this month: 2 day(s)",
            "last commit:       2024-01-03",
            "last updated:      3 hours ago",
        ];
        assert_eq!(result, expect);
    }

    #[test]
    fn status_age_and_staleness_agree() {
        let result = status_lines("octocat", &entry(), fetched() + Duration::hours(25));
        assert_eq!(result[5], "last updated:      1 day ago");
        assert_eq!(result[6], "cached data is stale, refresh it from the host app");
    }

    #[test]
    fn status_without_data() {
        let result = status_lines("octocat", &Entry::no_data(fetched()), fetched());
        assert_eq!(result, vec!["octocat: Open app to load data"]);
    }
}
