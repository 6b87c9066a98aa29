//! CLI module - Command-line interface for vigga
//!
//! Argument parsing uses clap derive; each command lives in `commands`.

mod commands;

use crate::models::ContainerFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vigga - Video downloader with quality selection and git sync helpers
#[derive(Parser)]
#[command(name = "vigga")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show title, uploader, duration and available qualities
    #[command(alias = "i")]
    Info {
        url: String,
        /// Save the thumbnail to this path
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },

    /// List the resolved quality options
    #[command(alias = "f")]
    Formats {
        url: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a video in the chosen quality
    #[command(alias = "d", alias = "dl")]
    Download {
        url: String,
        /// Index, resolution tag (1080p, 4k), "best" or "audio"
        #[arg(short, long)]
        quality: Option<String>,
        /// Output container: mp4, webm, mkv or mp3
        #[arg(short = 'f', long = "format")]
        container: Option<ContainerFormat>,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Stage, commit and push all changes in a repository
    Push {
        /// Repository path
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// Commit message (default: "<prefix>: <timestamp>")
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long)]
        remote: Option<String>,
        /// Branch to push (default: current branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Only stage and commit
        #[arg(long)]
        no_push: bool,
        /// Commit author as "Name <email>"
        #[arg(long)]
        author: Option<String>,
        /// Push attempts
        #[arg(long)]
        retry: Option<u32>,
    },

    /// Pull the latest changes from a remote
    Pull {
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        #[arg(short, long)]
        remote: Option<String>,
        /// Branch to pull (default: current branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Pull attempts
        #[arg(long)]
        retry: Option<u32>,
    },

    /// Create default config file
    Init,

    /// Check that yt-dlp and git can be run
    Doctor,
}

pub use commands::*;
