//! Metadata lookup followed by quality resolution.
//!
//! The [`MetadataLookup`] trait abstracts the external tool so that callers
//! can be exercised without spawning it.

use crate::clients::ytdlp::YtDlpError;
use crate::models::MediaInfo;
use crate::quality::QualityOption;
use tracing::{info, warn};

/// Source of media metadata for a URL.
#[async_trait::async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Fetches title, uploader, duration and the available encodings.
    ///
    /// # Errors
    ///
    /// - Returns [`YtDlpError::InvalidUrl`] for URLs the tool cannot handle
    /// - Returns [`YtDlpError::Failed`] with the tool's message on extraction failure
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo, YtDlpError>;
}

/// Metadata plus the quality ladder built from it.
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub info: MediaInfo,
    pub options: Vec<QualityOption>,
}

pub struct LookupService<L> {
    source: L,
}

impl<L: MetadataLookup> LookupService<L> {
    pub const fn new(source: L) -> Self {
        Self { source }
    }

    /// Looks up `url` and resolves its quality ladder.
    ///
    /// The resolver only runs when the lookup succeeded.
    pub async fn lookup(&self, url: &str) -> Result<LookupResult, YtDlpError> {
        let info = match self.source.fetch_info(url).await {
            Ok(info) => info,
            Err(e) => {
                warn!(url, error = %e, "Metadata lookup failed");
                return Err(e);
            }
        };

        let options = info.quality_options();
        info!(
            title = %info.title,
            options = options.len(),
            "Resolved quality options"
        );

        Ok(LookupResult { info, options })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{EncodingDescriptor, OptionKind};

    struct FakeLookup {
        result: Result<MediaInfo, String>,
    }

    #[async_trait::async_trait]
    impl MetadataLookup for FakeLookup {
        async fn fetch_info(&self, _url: &str) -> Result<MediaInfo, YtDlpError> {
            self.result.clone().map_err(YtDlpError::Failed)
        }
    }

    #[tokio::test]
    async fn test_lookup_resolves_options() {
        let service = LookupService::new(FakeLookup {
            result: Ok(MediaInfo {
                title: "Clip".to_string(),
                descriptors: vec![
                    EncodingDescriptor::video("22", 720).with_frame_rate(30.0),
                    EncodingDescriptor::video("18", 360),
                ],
                ..MediaInfo::default()
            }),
        });

        let result = service.lookup("https://example.com/v").await.unwrap();
        assert_eq!(result.info.title, "Clip");
        assert_eq!(result.options.len(), 3);
        assert_eq!(result.options[0].label, "720p 30fps");
        assert_eq!(result.options[2].kind, OptionKind::AudioOnly);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_passed_through() {
        let service = LookupService::new(FakeLookup {
            result: Err("Unsupported URL".to_string()),
        });

        let err = service.lookup("https://example.com/v").await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported URL");
    }
}
