//! Thin async wrapper around the `git` executable.
//!
//! Every command runs with prompts disabled and a fixed locale so that its
//! output can be matched on. Authentication is left to the user's ssh keys
//! or credential helper.

pub mod sync;

pub use sync::{PullOptions, SyncOptions, SyncOutcome, auto_update, pull_latest};

use crate::constants::process::GIT_ENV;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git executable not found")]
    NotFound,

    #[error("git {command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Invalid author {0:?}, expected \"Name <email>\"")]
    InvalidAuthor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Commit identity in the `Name <email>` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

impl FromStr for Author {
    type Err = GitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GitError::InvalidAuthor(s.to_string());

        let (name, email) = match s.split_once('<') {
            Some((name, rest)) => {
                let email = rest.strip_suffix('>').ok_or_else(invalid)?.trim();
                if email.is_empty() {
                    return Err(invalid());
                }
                (name.trim(), Some(email.to_string()))
            }
            None => (s.trim(), None),
        };

        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            email,
        })
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.email {
            Some(email) => write!(f, "{} <{email}>", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(3))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NothingToCommit,
}

#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Opens the work tree at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] when `path` is not inside a work tree.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, GitError> {
        let path = path.as_ref();
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let repo = Self { path };

        if !repo.is_work_tree().await? {
            return Err(GitError::NotARepository(repo.path));
        }

        info!(path = %repo.path.display(), "Opened git repository");
        Ok(repo)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn is_work_tree(&self) -> Result<bool, GitError> {
        if !self.path.is_dir() {
            return Ok(false);
        }

        let output = self.exec(&["rev-parse", "--is-inside-work-tree"]).await?;
        Ok(output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    pub async fn has_changes(&self) -> Result<bool, GitError> {
        let status = self.run(&["status", "--porcelain"]).await?;
        Ok(!status.trim().is_empty())
    }

    pub async fn add_all(&self) -> Result<(), GitError> {
        self.run(&["add", "-A"]).await.map(drop)
    }

    pub async fn commit(
        &self,
        message: &str,
        author: Option<&Author>,
    ) -> Result<CommitOutcome, GitError> {
        let mut overrides = Vec::new();
        if let Some(author) = author {
            overrides.push(format!("user.name={}", author.name));
            if let Some(email) = &author.email {
                overrides.push(format!("user.email={email}"));
            }
        }

        let mut args = Vec::new();
        for entry in &overrides {
            args.extend(["-c", entry.as_str()]);
        }
        args.extend(["commit", "-m", message]);

        let output = self.exec(&args).await?;
        if output.status.success() {
            info!(message, "Committed");
            return Ok(CommitOutcome::Committed);
        }

        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
        .to_lowercase();
        if combined.contains("nothing to commit") || combined.contains("no changes added to commit") {
            info!("Nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }

        Err(failure("commit", &output))
    }

    /// Checked-out branch name, or `None` when `HEAD` does not name one yet.
    pub async fn current_branch(&self) -> Option<String> {
        match self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await {
            Ok(branch) => {
                let branch = branch.trim();
                (!branch.is_empty() && branch != "HEAD").then(|| branch.to_string())
            }
            Err(e) => {
                debug!(error = %e, "Could not determine current branch");
                None
            }
        }
    }

    pub async fn fetch_all(&self) -> Result<(), GitError> {
        self.run(&["fetch", "--all", "--prune"]).await.map(drop)
    }

    pub async fn push(&self, remote: &str, branch: &str, retry: RetryPolicy) -> Result<(), GitError> {
        self.run_with_retry(&["push", remote, branch], retry).await
    }

    pub async fn pull(&self, remote: &str, branch: &str, retry: RetryPolicy) -> Result<(), GitError> {
        self.run_with_retry(&["pull", remote, branch], retry).await
    }

    async fn run_with_retry(&self, args: &[&str], retry: RetryPolicy) -> Result<(), GitError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(command = %args.join(" "), attempt, "Running git");

            match self.run(args).await {
                Ok(_) => return Ok(()),
                Err(e @ GitError::NotFound) => return Err(e),
                Err(e) if attempt >= retry.attempts => {
                    warn!(attempts = attempt, error = %e, "Giving up");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        error = %e,
                        "git {} failed. Retrying in {}s.",
                        args[0],
                        retry.delay.as_secs()
                    );
                    tokio::time::sleep(retry.delay).await;
                }
            }
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.exec(args).await?;
        if !output.status.success() {
            return Err(failure(args.first().copied().unwrap_or("git"), &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn exec(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(path = %self.path.display(), "git {}", args.join(" "));

        let output = crate::process::command("git")
            .args(args)
            .current_dir(&self.path)
            .envs(GIT_ENV.iter().copied())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    GitError::NotFound
                } else {
                    GitError::Io(e)
                }
            })?;

        debug!(
            status = %output.status,
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "git finished"
        );
        Ok(output)
    }
}

fn failure(command: &str, output: &Output) -> GitError {
    GitError::CommandFailed {
        command: command.to_string(),
        status: output
            .status
            .code()
            .map_or_else(|| "killed".to_string(), |c| format!("exit {c}")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
