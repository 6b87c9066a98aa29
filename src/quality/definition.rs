use serde::{Deserialize, Serialize};

/// Vertical resolutions that may appear in the quality ladder.
pub const STANDARD_HEIGHTS: [u32; 9] = [144, 240, 360, 480, 720, 1080, 1440, 2160, 4320];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resolution(u32);

impl Resolution {
    /// Returns `None` for heights outside [`STANDARD_HEIGHTS`].
    #[must_use]
    pub fn from_height(height: u32) -> Option<Self> {
        STANDARD_HEIGHTS.contains(&height).then_some(Self(height))
    }

    #[must_use]
    pub const fn height(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn tag(self) -> String {
        match self.0 {
            2160 => "4K".to_string(),
            4320 => "8K".to_string(),
            h => format!("{h}p"),
        }
    }

    /// Parses a tag such as `1080p`, `4k` or a bare `720`.
    #[must_use]
    pub fn parse_tag(tag: &str) -> Option<Self> {
        let lower = tag.trim().to_lowercase();
        match lower.as_str() {
            "4k" | "uhd" => Some(Self(2160)),
            "8k" => Some(Self(4320)),
            _ => lower
                .strip_suffix('p')
                .unwrap_or(&lower)
                .parse::<u32>()
                .ok()
                .and_then(Self::from_height),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Coarse frame-rate bucket shown next to the resolution tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRateBand {
    Sixty,
    Thirty,
    Other,
}

impl FrameRateBand {
    #[must_use]
    pub fn classify(fps: f64) -> Self {
        if (58.0..=62.0).contains(&fps) {
            Self::Sixty
        } else if (28.0..=32.0).contains(&fps) {
            Self::Thirty
        } else {
            Self::Other
        }
    }

    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Sixty => " 60fps",
            Self::Thirty => " 30fps",
            Self::Other => "",
        }
    }
}
