//! Parsing of the line-oriented output produced by a yt-dlp transfer.

use super::size::format_rate;
use crate::constants::transfer::{FILE_PREFIX, PROGRESS_PREFIX, TITLE_PREFIX};
use std::path::PathBuf;

/// One progress sample as reported by the download tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferProgress {
    pub downloaded: u64,

    /// Exact or estimated total; `None` while unknown.
    pub total: Option<u64>,

    /// Bytes per second.
    pub rate: Option<f64>,
}

impl TransferProgress {
    /// Whole percent in `0..=100`; zero while the total is unknown.
    #[must_use]
    pub fn percent(&self) -> u8 {
        match self.total {
            Some(total) if total > 0 => {
                let pct = self.downloaded.saturating_mul(100) / total;
                u8::try_from(pct.min(100)).unwrap_or(100)
            }
            _ => 0,
        }
    }

    #[must_use]
    pub fn status(&self) -> String {
        match self.rate {
            Some(rate) => format!("Downloading... {}% ({})", self.percent(), format_rate(rate)),
            None => format!("Downloading... {}%", self.percent()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Progress(TransferProgress),
    /// Post-processing (merging, audio extraction) has started.
    Processing,
    Title(String),
    File(PathBuf),
    Error(String),
    Other,
}

#[must_use]
pub fn parse_line(line: &str) -> OutputLine {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(PROGRESS_PREFIX) {
        return parse_progress(rest).map_or(OutputLine::Other, OutputLine::Progress);
    }

    if let Some(title) = line.strip_prefix(TITLE_PREFIX) {
        return OutputLine::Title(title.trim().to_string());
    }

    if let Some(path) = line.strip_prefix(FILE_PREFIX) {
        return OutputLine::File(PathBuf::from(path.trim()));
    }

    if line.starts_with("[Merger]")
        || line.starts_with("[ExtractAudio]")
        || line.starts_with("[VideoConvertor]")
        || line.starts_with("[VideoRemuxer]")
    {
        return OutputLine::Processing;
    }

    if let Some(message) = line.strip_prefix("ERROR:") {
        return OutputLine::Error(message.trim().to_string());
    }

    OutputLine::Other
}

/// `<downloaded>|<total>|<total estimate>|<speed>`; yt-dlp writes `NA` for
/// missing fields.
fn parse_progress(fields: &str) -> Option<TransferProgress> {
    let mut parts = fields.split('|').map(str::trim);

    let downloaded = parse_bytes(parts.next()?)?;
    let total = parts.next().and_then(parse_bytes);
    let estimate = parts.next().and_then(parse_bytes);
    let rate = parts
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r > 0.0);

    Some(TransferProgress {
        downloaded,
        total: total.or(estimate).filter(|t| *t > 0),
        rate,
    })
}

fn parse_bytes(s: &str) -> Option<u64> {
    let value = s.parse::<f64>().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_with_total() {
        let line = parse_line("progress:512|1024|NA|2048.5");
        let OutputLine::Progress(p) = line else {
            panic!("expected progress, got {line:?}");
        };
        assert_eq!(p.downloaded, 512);
        assert_eq!(p.total, Some(1024));
        assert_eq!(p.percent(), 50);
        assert_eq!(p.status(), "Downloading... 50% (2.00 KiB/s)");
    }

    #[test]
    fn test_progress_line_uses_estimate() {
        let OutputLine::Progress(p) = parse_line("progress:300|NA|1000.7|NA") else {
            panic!("expected progress");
        };
        assert_eq!(p.total, Some(1000));
        assert_eq!(p.rate, None);
        assert_eq!(p.status(), "Downloading... 30%");
    }

    #[test]
    fn test_progress_unknown_total() {
        let OutputLine::Progress(p) = parse_line("progress:300|NA|NA|NA") else {
            panic!("expected progress");
        };
        assert_eq!(p.percent(), 0);
    }

    #[test]
    fn test_percent_clamped() {
        let p = TransferProgress {
            downloaded: 2000,
            total: Some(1000),
            rate: None,
        };
        assert_eq!(p.percent(), 100);
    }

    #[test]
    fn test_print_lines() {
        assert_eq!(
            parse_line("title:Some Video"),
            OutputLine::Title("Some Video".to_string())
        );
        assert_eq!(
            parse_line("file:/tmp/Some Video.mp4"),
            OutputLine::File(PathBuf::from("/tmp/Some Video.mp4"))
        );
    }

    #[test]
    fn test_processing_and_errors() {
        assert_eq!(
            parse_line("[Merger] Merging formats into \"a.mp4\""),
            OutputLine::Processing
        );
        assert_eq!(
            parse_line("ERROR: [youtube] abc: Video unavailable"),
            OutputLine::Error("[youtube] abc: Video unavailable".to_string())
        );
        assert_eq!(parse_line("[info] Writing video subtitles"), OutputLine::Other);
        assert_eq!(parse_line("progress:garbage"), OutputLine::Other);
    }
}
