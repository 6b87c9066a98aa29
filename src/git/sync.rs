//! Stage/commit/push and pull workflows built on [`GitRepo`].

use super::{Author, CommitOutcome, GitError, GitRepo, RetryPolicy};
use crate::constants::git::{PULL_FALLBACK_BRANCH, PUSH_FALLBACK_BRANCH};
use chrono::{DateTime, Local};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Commit message; generated from `message_prefix` and the time when unset.
    pub message: Option<String>,
    pub message_prefix: String,
    pub remote: String,
    pub branch: Option<String>,
    pub author: Option<Author>,
    pub no_push: bool,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            message: None,
            message_prefix: "Auto-update".to_string(),
            remote: "origin".to_string(),
            branch: None,
            author: None,
            no_push: false,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The work tree was clean after staging.
    NoChanges,
    NothingToCommit,
    /// Committed without pushing.
    Committed { message: String },
    Pushed {
        message: String,
        remote: String,
        branch: String,
    },
}

#[must_use]
pub fn default_message(prefix: &str, now: DateTime<Local>) -> String {
    format!("{prefix}: {}", now.format("%Y-%m-%d %H:%M:%S"))
}

/// Stages everything, commits and pushes unless `no_push` is set.
pub async fn auto_update(repo: &GitRepo, options: &SyncOptions) -> Result<SyncOutcome, GitError> {
    repo.add_all().await?;

    if !repo.has_changes().await? {
        info!("No changes detected");
        return Ok(SyncOutcome::NoChanges);
    }

    let message = options
        .message
        .clone()
        .unwrap_or_else(|| default_message(&options.message_prefix, Local::now()));

    if repo.commit(&message, options.author.as_ref()).await? == CommitOutcome::NothingToCommit {
        return Ok(SyncOutcome::NothingToCommit);
    }

    if options.no_push {
        info!("Skipping push");
        return Ok(SyncOutcome::Committed { message });
    }

    // Resolved after committing so that a first commit names the branch.
    let branch = match &options.branch {
        Some(branch) => branch.clone(),
        None => repo
            .current_branch()
            .await
            .unwrap_or_else(|| PUSH_FALLBACK_BRANCH.to_string()),
    };

    repo.push(&options.remote, &branch, options.retry).await?;
    info!(remote = %options.remote, branch = %branch, "Push successful");

    Ok(SyncOutcome::Pushed {
        message,
        remote: options.remote.clone(),
        branch,
    })
}

#[derive(Debug, Clone)]
pub struct PullOptions {
    pub remote: String,
    pub branch: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Pulls `remote`/`branch` and returns the branch that was pulled.
pub async fn pull_latest(repo: &GitRepo, options: &PullOptions) -> Result<String, GitError> {
    let branch = match &options.branch {
        Some(branch) => branch.clone(),
        None => repo
            .current_branch()
            .await
            .unwrap_or_else(|| PULL_FALLBACK_BRANCH.to_string()),
    };

    // Refreshes remote-tracking refs; the pull below still decides the outcome.
    if let Err(e) = repo.fetch_all().await {
        warn!(error = %e, "Fetch failed");
    }

    repo.pull(&options.remote, &branch, options.retry).await?;
    info!(remote = %options.remote, branch = %branch, "Pull successful");
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_message() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            default_message("Auto-update", now),
            "Auto-update: 2024-03-09 07:05:01"
        );
    }

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert_eq!(options.remote, "origin");
        assert!(!options.no_push);
        assert!(options.message.is_none());
    }
}
