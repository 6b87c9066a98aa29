pub mod definition;
pub mod descriptor;
pub mod resolver;

pub use definition::{FrameRateBand, Resolution, STANDARD_HEIGHTS};
pub use descriptor::EncodingDescriptor;
pub use resolver::{
    AUDIO_ONLY_LABEL, BEST_AUDIO_SELECTOR, BEST_AVAILABLE_LABEL, BEST_AVAILABLE_SELECTOR,
    OptionKind, QualityOption, resolve,
};

/// Picks an entry from a resolved ladder by user input.
///
/// Accepts a 1-based index, a resolution tag (`1080p`, `4k`), `best` or
/// `audio`. Matching a tag ignores the frame-rate and size suffixes.
#[must_use]
pub fn find_option<'a>(options: &'a [QualityOption], query: &str) -> Option<&'a QualityOption> {
    let query = query.trim();

    if let Ok(index) = query.parse::<usize>()
        && let Some(option) = index.checked_sub(1).and_then(|i| options.get(i))
    {
        return Some(option);
    }

    match query.to_lowercase().as_str() {
        "audio" | "audio-only" | "mp3" => return options.iter().find(|o| o.is_audio_only()),
        // The first entry is always the best the ladder has to offer.
        "best" => return options.first(),
        _ => {}
    }

    let resolution = Resolution::parse_tag(query)?;
    options
        .iter()
        .find(|o| o.height() == Some(resolution.height()))
}
