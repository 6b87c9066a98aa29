use crate::config::YtDlpConfig;
use crate::models::MediaInfo;
use crate::quality::EncodingDescriptor;
use serde::Deserialize;
use std::io::ErrorKind;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum YtDlpError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("yt-dlp executable not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("Metadata lookup timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to parse yt-dlp output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    thumbnail: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    height: Option<f64>,
    fps: Option<f64>,
    tbr: Option<f64>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

impl RawFormat {
    fn into_descriptor(self) -> Option<EncodingDescriptor> {
        let format_id = self.format_id.filter(|id| !id.trim().is_empty())?;

        let height = self
            .height
            .and_then(whole_number)
            .and_then(|h| u32::try_from(h).ok())
            .filter(|h| *h > 0);

        let video_codec_none = self.vcodec.as_deref() == Some("none");
        let has_video = !video_codec_none && (self.vcodec.is_some() || height.is_some());
        let video_only = self.acodec.as_deref() == Some("none");

        let selector_id = if has_video && video_only {
            format!("{format_id}+bestaudio/{format_id}")
        } else {
            format_id
        };

        let file_size = self
            .filesize
            .or(self.filesize_approx)
            .and_then(whole_number)
            .filter(|s| *s > 0);

        Some(EncodingDescriptor {
            height,
            frame_rate: self.fps,
            bitrate: self.tbr,
            file_size,
            has_video,
            selector_id,
        })
    }
}

fn whole_number(value: f64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value.round() as u64)
}

/// Parses the JSON document printed by `yt-dlp -J`.
pub fn parse_info(json: &[u8]) -> Result<MediaInfo, YtDlpError> {
    let raw: RawInfo = serde_json::from_slice(json)?;

    let uploader = raw
        .uploader
        .or(raw.channel)
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(MediaInfo {
        title: raw
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        uploader,
        thumbnail: raw.thumbnail.filter(|t| !t.is_empty()),
        description: raw.description.filter(|d| !d.is_empty()),
        duration_seconds: raw
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0),
        descriptors: raw
            .formats
            .into_iter()
            .filter_map(RawFormat::into_descriptor)
            .collect(),
    })
}

/// Accepts absolute `http`/`https` URLs with a host.
pub fn validate_url(input: &str) -> Result<Url, YtDlpError> {
    let url = Url::parse(input.trim()).map_err(|e| YtDlpError::InvalidUrl(format!("{input}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(YtDlpError::InvalidUrl(input.to_string()));
    }

    Ok(url)
}

/// Picks the most useful line from the tool's stderr.
#[must_use]
pub fn error_message(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("ERROR:"))
        .or_else(|| lines.last().copied())
        .map(|l| l.trim().to_string())
}

#[derive(Debug, Clone)]
pub struct YtDlpClient {
    config: YtDlpConfig,
}

impl YtDlpClient {
    #[must_use]
    pub const fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub async fn fetch_info(&self, url: &str) -> Result<MediaInfo, YtDlpError> {
        let url = validate_url(url)?;
        info!(url = %url, "Fetching media info");

        let mut cmd = self.config.command();
        cmd.args(["-J", "--no-playlist", "--no-warnings"])
            .args(&self.config.extra_args)
            .arg(url.as_str());

        let timeout = self.config.lookup_timeout();
        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| YtDlpError::Timeout(timeout.as_secs()))?
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = error_message(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            debug!(status = %output.status, stderr = %stderr.trim(), "yt-dlp lookup failed");
            return Err(YtDlpError::Failed(message));
        }

        let info = parse_info(&output.stdout)?;
        debug!(
            title = %info.title,
            formats = info.descriptors.len(),
            duration = info.duration_seconds,
            "Media info parsed"
        );
        Ok(info)
    }

    pub async fn version(&self) -> Result<String, YtDlpError> {
        let output = self
            .config
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.map_spawn_error(e))?;

        if !output.status.success() {
            return Err(YtDlpError::Failed(format!(
                "yt-dlp --version exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn map_spawn_error(&self, e: std::io::Error) -> YtDlpError {
        if e.kind() == ErrorKind::NotFound {
            YtDlpError::NotFound(self.config.binary.clone())
        } else {
            YtDlpError::Io(e)
        }
    }
}

#[async_trait::async_trait]
impl crate::services::MetadataLookup for YtDlpClient {
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo, YtDlpError> {
        Self::fetch_info(self, url).await
    }
}
