use crate::config::Config;
use crate::git::{self, Author, GitRepo, PullOptions, RetryPolicy, SyncOptions, SyncOutcome};
use std::path::Path;
use std::time::Duration;

pub struct PushArgs {
    pub message: Option<String>,
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub no_push: bool,
    pub author: Option<String>,
    pub retry: Option<u32>,
}

pub async fn cmd_push(config: &Config, path: &Path, args: PushArgs) -> anyhow::Result<()> {
    let repo = GitRepo::open(path).await?;
    println!("Repository: {}", repo.path().display());

    let author = args.author.as_deref().map(str::parse::<Author>).transpose()?;

    let options = SyncOptions {
        message: args.message,
        message_prefix: config.git.message_prefix.clone(),
        remote: args.remote.unwrap_or_else(|| config.git.remote.clone()),
        branch: args.branch.or_else(|| config.git.branch.clone()),
        author,
        no_push: args.no_push,
        retry: retry_policy(config, args.retry.unwrap_or(config.git.push_retries)),
    };

    match git::auto_update(&repo, &options).await? {
        SyncOutcome::NoChanges => println!("No changes to commit."),
        SyncOutcome::NothingToCommit => println!("Nothing to commit after staging."),
        SyncOutcome::Committed { message } => println!("✓ Committed: {message} (push skipped)"),
        SyncOutcome::Pushed {
            message,
            remote,
            branch,
        } => {
            println!("✓ Committed: {message}");
            println!("✓ Pushed to {remote}/{branch}");
        }
    }

    Ok(())
}

pub async fn cmd_pull(
    config: &Config,
    path: &Path,
    remote: Option<String>,
    branch: Option<String>,
    retry: Option<u32>,
) -> anyhow::Result<()> {
    let repo = GitRepo::open(path).await?;
    println!("Repository: {}", repo.path().display());

    let options = PullOptions {
        remote: remote.unwrap_or_else(|| config.git.remote.clone()),
        branch: branch.or_else(|| config.git.branch.clone()),
        retry: retry_policy(config, retry.unwrap_or(config.git.pull_retries)),
    };

    let branch = git::pull_latest(&repo, &options).await?;
    println!("✓ Pulled {}/{branch}", options.remote);
    Ok(())
}

const fn retry_policy(config: &Config, attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        attempts,
        Duration::from_secs(config.git.retry_delay_seconds),
    )
}
