use crate::quality::{EncodingDescriptor, QualityOption, resolve};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Result of a metadata lookup for one URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub uploader: String,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: f64,
    pub descriptors: Vec<EncodingDescriptor>,
}

impl MediaInfo {
    #[must_use]
    pub fn quality_options(&self) -> Vec<QualityOption> {
        resolve(&self.descriptors, self.duration_seconds)
    }

    #[must_use]
    pub fn duration_str(&self) -> String {
        if self.duration_seconds <= 0.0 || !self.duration_seconds.is_finite() {
            return "?".to_string();
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let total = self.duration_seconds.round() as u64;
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m}:{s:02}")
        }
    }
}

/// Container the finished download is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mp4,
    Webm,
    Mkv,
    Mp3,
}

impl ContainerFormat {
    pub const ALL: [Self; 4] = [Self::Mp4, Self::Webm, Self::Mkv, Self::Mp3];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mkv => "mkv",
            Self::Mp3 => "mp3",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Mp4 => "MP4",
            Self::Webm => "WEBM",
            Self::Mkv => "MKV",
            Self::Mp3 => "Audio Only (MP3)",
        }
    }

    #[must_use]
    pub const fn is_audio(self) -> bool {
        matches!(self, Self::Mp3)
    }

    /// yt-dlp arguments that produce this container.
    #[must_use]
    pub fn ytdlp_args(self) -> Vec<String> {
        if self.is_audio() {
            vec![
                "-x".to_string(),
                "--audio-format".to_string(),
                self.extension().to_string(),
            ]
        } else {
            vec![
                "--merge-output-format".to_string(),
                self.extension().to_string(),
            ]
        }
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ContainerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "mkv" => Ok(Self::Mkv),
            "mp3" | "audio" => Ok(Self::Mp3),
            other => Err(format!(
                "unknown container format '{other}' (expected one of: {})",
                Self::ALL.map(Self::extension).join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_parse() {
        assert_eq!("MKV".parse::<ContainerFormat>(), Ok(ContainerFormat::Mkv));
        assert_eq!("audio".parse::<ContainerFormat>(), Ok(ContainerFormat::Mp3));
        assert_eq!(
            "avi".parse::<ContainerFormat>(),
            Err("unknown container format 'avi' (expected one of: mp4, webm, mkv, mp3)".to_string())
        );
    }

    #[test]
    fn test_container_args() {
        assert_eq!(
            ContainerFormat::Webm.ytdlp_args(),
            vec!["--merge-output-format", "webm"]
        );
        assert_eq!(ContainerFormat::Mp3.ytdlp_args(), vec!["-x", "--audio-format", "mp3"]);
    }

    #[test]
    fn test_duration_str() {
        let mut info = MediaInfo::default();
        assert_eq!(info.duration_str(), "?");
        info.duration_seconds = 212.4;
        assert_eq!(info.duration_str(), "3:32");
        info.duration_seconds = 3725.0;
        assert_eq!(info.duration_str(), "1:02:05");
    }

    #[test]
    fn test_quality_options_use_duration() {
        let info = MediaInfo {
            duration_seconds: 105.0,
            descriptors: vec![EncodingDescriptor::video("137", 1080).with_bitrate(8000.0)],
            ..MediaInfo::default()
        };
        let options = info.quality_options();
        assert_eq!(options[0].label, "1080p 100MB");
    }
}
