//! Runs yt-dlp for one download as a background task.
//!
//! Progress is reported through a bounded channel of [`TransferEvent`]s and
//! the task can be stopped through a [`CancellationToken`]; cancelling kills
//! the tool and removes the partial files it left behind.

use crate::clients::ytdlp::validate_url;
use crate::config::{DownloadConfig, YtDlpConfig};
use crate::constants::PARTIAL_EXTENSIONS;
use crate::constants::transfer::{EVENT_BUFFER, FILE_PREFIX, PROGRESS_TEMPLATE, TITLE_PREFIX};
use crate::domain::TransferEvent;
use crate::models::ContainerFormat;
use crate::parser::{OutputLine, parse_line};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("yt-dlp executable not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,

    /// Selector token from a resolved quality option.
    pub selector: String,

    pub container: ContainerFormat,

    pub output_dir: PathBuf,
}

enum Outcome {
    Finished { title: String, path: Option<PathBuf> },
    Cancelled,
}

/// Handle to a running transfer.
pub struct DownloadHandle {
    events: mpsc::Receiver<TransferEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl DownloadHandle {
    pub async fn next_event(&mut self) -> Option<TransferEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drains events until the terminal one, handing progress to `on_progress`.
    pub async fn wait(mut self, mut on_progress: impl FnMut(u8, &str)) -> TransferEvent {
        while let Some(event) = self.events.recv().await {
            if !event.is_terminal() {
                if let TransferEvent::Progress { percent, message } = &event {
                    on_progress(*percent, message);
                }
                continue;
            }
            if let Err(e) = self.task.await {
                warn!(error = %e, "Transfer task did not shut down cleanly");
            }
            return event;
        }

        TransferEvent::Failed {
            error: "transfer task ended unexpectedly".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferService {
    ytdlp: YtDlpConfig,
    output_template: String,
}

impl TransferService {
    #[must_use]
    pub fn new(ytdlp: YtDlpConfig, downloads: &DownloadConfig) -> Self {
        Self {
            ytdlp,
            output_template: downloads.output_template.clone(),
        }
    }

    #[must_use]
    pub fn build_args(&self, request: &DownloadRequest) -> Vec<String> {
        let output = request
            .output_dir
            .join(&self.output_template)
            .to_string_lossy()
            .to_string();

        let mut args = vec!["-f".to_string(), request.selector.clone()];
        args.extend(request.container.ytdlp_args());
        args.extend([
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--print".to_string(),
            format!("after_move:{TITLE_PREFIX}%(title)s"),
            "--print".to_string(),
            format!("after_move:{FILE_PREFIX}%(filepath)s"),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            output,
        ]);
        args.extend(self.ytdlp.extra_args.iter().cloned());
        args.push(request.url.clone());
        args
    }

    /// Spawns the transfer and returns immediately.
    pub fn start(&self, request: DownloadRequest) -> Result<DownloadHandle, TransferError> {
        if validate_url(&request.url).is_err() {
            return Err(TransferError::InvalidUrl(request.url));
        }

        let mut cmd = self.ytdlp.command();
        cmd.args(self.build_args(&request));

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let binary = self.ytdlp.binary.clone();
        let started = SystemTime::now();

        info!(
            url = %request.url,
            selector = %request.selector,
            container = %request.container,
            "Starting download"
        );

        let task = tokio::spawn(async move {
            let outcome = run_transfer(cmd, &binary, &request.output_dir, &tx, &task_cancel).await;
            let event = match outcome {
                Ok(Outcome::Finished { title, path }) => {
                    info!(title = %title, "Download finished");
                    TransferEvent::Finished { title, path }
                }
                Ok(Outcome::Cancelled) => {
                    let removed = cleanup_partials(&request.output_dir, started).await;
                    info!(removed, "Download cancelled");
                    TransferEvent::Cancelled
                }
                Err(e) => {
                    warn!(error = %e, "Download failed");
                    TransferEvent::Failed {
                        error: e.to_string(),
                    }
                }
            };

            if tx.send(event).await.is_err() {
                debug!("Transfer event receiver dropped");
            }
        });

        Ok(DownloadHandle {
            events: rx,
            cancel,
            task,
        })
    }
}

async fn run_transfer(
    mut cmd: Command,
    binary: &str,
    output_dir: &Path,
    events: &mpsc::Sender<TransferEvent>,
    cancel: &CancellationToken,
) -> Result<Outcome, TransferError> {
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }

    tokio::fs::create_dir_all(output_dir).await?;

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                TransferError::NotFound(binary.to_string())
            } else {
                TransferError::Io(e)
            }
        })?;

    // yt-dlp moves progress to stderr in quiet mode, so both streams are read.
    let (line_tx, mut lines) = mpsc::channel::<String>(EVENT_BUFFER);
    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, line_tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, line_tx.clone())));
    }
    drop(line_tx);

    let mut state = TransferState::default();

    loop {
        tokio::select! {
            () = cancel.cancelled() => return Ok(stop(&mut child, &readers).await),
            line = lines.recv() => {
                let Some(line) = line else { break };
                let Some(event) = state.observe(&line) else { continue };
                // A consumer that stops draining must not hold off a cancel.
                tokio::select! {
                    () = cancel.cancelled() => return Ok(stop(&mut child, &readers).await),
                    sent = events.send(event) => {
                        if sent.is_err() {
                            debug!("Transfer event receiver dropped");
                        }
                    }
                }
            }
        }
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(Outcome::Finished {
            title: state.title.unwrap_or_else(|| "Video".to_string()),
            path: state.path,
        })
    } else {
        Err(TransferError::Failed(
            state
                .last_error
                .unwrap_or_else(|| format!("yt-dlp exited with {status}")),
        ))
    }
}

async fn stop(child: &mut Child, readers: &[JoinHandle<()>]) -> Outcome {
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill yt-dlp");
    }
    for reader in readers {
        reader.abort();
    }
    Outcome::Cancelled
}

/// Forwards lines until EOF. Bytes that are not UTF-8 are replaced, never fatal,
/// so the pipe stays open for the rest of the output.
async fn forward_lines<R: AsyncRead + Unpin>(reader: R, tx: mpsc::Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read yt-dlp output");
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']).to_string();
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

#[derive(Debug, Default)]
struct TransferState {
    percent: u8,
    title: Option<String>,
    path: Option<PathBuf>,
    last_error: Option<String>,
}

impl TransferState {
    fn observe(&mut self, line: &str) -> Option<TransferEvent> {
        match parse_line(line) {
            OutputLine::Progress(progress) => {
                let percent = progress.percent();
                // A second stream (audio after video) restarts at zero.
                if percent < self.percent {
                    return None;
                }
                self.percent = percent;
                Some(TransferEvent::Progress {
                    percent,
                    message: progress.status(),
                })
            }
            OutputLine::Processing => {
                self.percent = 100;
                Some(TransferEvent::Progress {
                    percent: 100,
                    message: "Processing...".to_string(),
                })
            }
            OutputLine::Title(title) => {
                self.title = Some(title);
                None
            }
            OutputLine::File(path) => {
                self.path = Some(path);
                None
            }
            OutputLine::Error(message) => {
                self.last_error = Some(message);
                None
            }
            OutputLine::Other => {
                debug!(line, "yt-dlp");
                None
            }
        }
    }
}

#[must_use]
pub fn is_partial(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    name.contains(".part-Frag")
        || PARTIAL_EXTENSIONS
            .iter()
            .any(|ext| path.extension().is_some_and(|e| e == *ext))
}

/// Removes partial files in `dir` touched since `since`.
async fn cleanup_partials(dir: &Path, since: SystemTime) -> usize {
    // mtime granularity differs between filesystems
    let threshold = since.checked_sub(Duration::from_secs(2)).unwrap_or(since);

    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return 0;
    };

    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !is_partial(&path) {
            continue;
        }

        let recent = entry
            .metadata()
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .is_some_and(|modified| modified >= threshold);
        if !recent {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed partial file");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial file"),
        }
    }

    removed
}
