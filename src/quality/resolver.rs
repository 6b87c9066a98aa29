//! Turns the raw encoding list of a media item into the quality ladder shown
//! to the user: one entry per standard resolution, best encoding first, plus
//! the synthetic fallback and audio-only entries.

use super::definition::{FrameRateBand, Resolution};
use super::descriptor::EncodingDescriptor;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Selector asking the download tool for its own best video+audio pick.
pub const BEST_AVAILABLE_SELECTOR: &str = "bestvideo+bestaudio/best";

/// Selector asking the download tool for the best audio stream.
pub const BEST_AUDIO_SELECTOR: &str = "bestaudio/best";

pub const BEST_AVAILABLE_LABEL: &str = "Best available";
pub const AUDIO_ONLY_LABEL: &str = "Audio only (best available)";

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionKind {
    Video { height: u32 },
    BestAvailable,
    AudioOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    pub label: String,

    pub selector_id: String,

    pub kind: OptionKind,
}

impl QualityOption {
    fn best_available() -> Self {
        Self {
            label: BEST_AVAILABLE_LABEL.to_string(),
            selector_id: BEST_AVAILABLE_SELECTOR.to_string(),
            kind: OptionKind::BestAvailable,
        }
    }

    fn audio_only() -> Self {
        Self {
            label: AUDIO_ONLY_LABEL.to_string(),
            selector_id: BEST_AUDIO_SELECTOR.to_string(),
            kind: OptionKind::AudioOnly,
        }
    }

    #[must_use]
    pub const fn height(&self) -> Option<u32> {
        match self.kind {
            OptionKind::Video { height } => Some(height),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_audio_only(&self) -> bool {
        matches!(self.kind, OptionKind::AudioOnly)
    }
}

impl std::fmt::Display for QualityOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Builds the ordered quality ladder for one media item.
///
/// `duration_seconds` is only used to estimate sizes for encodings that do
/// not report one; pass `0.0` to skip estimation.
#[must_use]
pub fn resolve(descriptors: &[EncodingDescriptor], duration_seconds: f64) -> Vec<QualityOption> {
    let mut winners: HashMap<Resolution, &EncodingDescriptor> = HashMap::new();

    for descriptor in descriptors {
        if !descriptor.has_video {
            continue;
        }
        let Some(resolution) = descriptor.height.and_then(Resolution::from_height) else {
            continue;
        };

        winners
            .entry(resolution)
            .and_modify(|current| {
                if compare_encodings(descriptor, current) == Ordering::Greater {
                    *current = descriptor;
                }
            })
            .or_insert(descriptor);
    }

    let mut ladder: Vec<(Resolution, &EncodingDescriptor)> = winners.into_iter().collect();
    ladder.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let mut options: Vec<QualityOption> = ladder
        .into_iter()
        .map(|(resolution, winner)| QualityOption {
            label: build_label(resolution, winner, duration_seconds),
            selector_id: winner.selector_id.clone(),
            kind: OptionKind::Video {
                height: resolution.height(),
            },
        })
        .collect();

    if options.is_empty() {
        options.push(QualityOption::best_available());
    }
    options.push(QualityOption::audio_only());

    options
}

/// Orders two encodings of the same height by `(frame rate, bitrate)`.
fn compare_encodings(a: &EncodingDescriptor, b: &EncodingDescriptor) -> Ordering {
    a.effective_frame_rate()
        .total_cmp(&b.effective_frame_rate())
        .then_with(|| a.effective_bitrate().total_cmp(&b.effective_bitrate()))
}

fn build_label(
    resolution: Resolution,
    winner: &EncodingDescriptor,
    duration_seconds: f64,
) -> String {
    let mut label = resolution.tag();
    label.push_str(FrameRateBand::classify(winner.effective_frame_rate()).suffix());

    if let Some(bytes) = winner.size_or_estimate(duration_seconds) {
        label.push_str(&format!(" {}MB", bytes / BYTES_PER_MB));
    }

    label
}
