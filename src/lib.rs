pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod git;
pub mod models;
pub mod parser;
pub mod process;
pub mod quality;
pub mod services;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, PushArgs};
pub use config::Config;
use config::GeneralConfig;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    let _log_guard = init_logging(&config.general)?;

    match cli.command {
        Commands::Info { url, thumbnail } => cli::cmd_info(&config, &url, thumbnail.as_deref()).await,

        Commands::Formats { url, json } => cli::cmd_formats(&config, &url, json).await,

        Commands::Download {
            url,
            quality,
            container,
            output,
        } => cli::cmd_download(&config, &url, quality.as_deref(), container, output).await,

        Commands::Push {
            path,
            message,
            remote,
            branch,
            no_push,
            author,
            retry,
        } => {
            let args = PushArgs {
                message,
                remote,
                branch,
                no_push,
                author,
                retry,
            };
            cli::cmd_push(&config, &path, args).await
        }

        Commands::Pull {
            path,
            remote,
            branch,
            retry,
        } => cli::cmd_pull(&config, &path, remote, branch, retry).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }

        Commands::Doctor => cli::cmd_doctor(&config).await,
    }
}

/// Console logging on stderr plus an optional detailed log file.
///
/// The returned guard flushes the file writer and must be held until exit.
fn init_logging(general: &GeneralConfig) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let console: Box<dyn Layer<Registry> + Send + Sync> = if general.log_format == "json" {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter)
            .boxed()
    };

    let mut layers = vec![console];
    let mut guard = None;

    if let Some(log_file) = &general.log_file {
        let path = Path::new(log_file);
        let file_name = path
            .file_name()
            .with_context(|| format!("general.log_file has no file name: {log_file}"))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let (writer, file_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        guard = Some(file_guard);

        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_line_number(true)
                .with_filter(EnvFilter::new("info,vigga=debug"))
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();

    if let Some(log_file) = &general.log_file {
        info!(path = %log_file, "Logging to file");
    }

    Ok(guard)
}
