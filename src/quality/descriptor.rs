use serde::{Deserialize, Serialize};

/// One concrete stream variant reported by the metadata lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingDescriptor {
    pub height: Option<u32>,

    /// Frames per second.
    pub frame_rate: Option<f64>,

    /// Average bitrate in kbps.
    pub bitrate: Option<f64>,

    /// Size in bytes, when the source reports one.
    pub file_size: Option<u64>,

    pub has_video: bool,

    pub selector_id: String,
}

impl EncodingDescriptor {
    #[must_use]
    pub fn video(selector_id: impl Into<String>, height: u32) -> Self {
        Self {
            height: Some(height),
            has_video: true,
            selector_id: selector_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn audio(selector_id: impl Into<String>) -> Self {
        Self {
            selector_id: selector_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    #[must_use]
    pub fn with_bitrate(mut self, kbps: f64) -> Self {
        self.bitrate = Some(kbps);
        self
    }

    #[must_use]
    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size = Some(bytes);
        self
    }

    /// Frame rate with missing, negative or non-finite values read as zero.
    #[must_use]
    pub fn effective_frame_rate(&self) -> f64 {
        sanitize(self.frame_rate)
    }

    #[must_use]
    pub fn effective_bitrate(&self) -> f64 {
        sanitize(self.bitrate)
    }

    /// Known size, or `bitrate * 1000 / 8 * duration` when both are positive.
    #[must_use]
    pub fn size_or_estimate(&self, duration_seconds: f64) -> Option<u64> {
        if self.file_size.is_some() {
            return self.file_size;
        }

        let bitrate = self.effective_bitrate();
        let duration = sanitize(Some(duration_seconds));
        if bitrate <= 0.0 || duration <= 0.0 {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some((bitrate * 1000.0 / 8.0 * duration).floor() as u64)
    }
}

fn sanitize(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_values_ignore_garbage() {
        let d = EncodingDescriptor::video("137", 1080)
            .with_frame_rate(f64::NAN)
            .with_bitrate(-5.0);
        assert!(d.effective_frame_rate().abs() < f64::EPSILON);
        assert!(d.effective_bitrate().abs() < f64::EPSILON);
    }

    #[test]
    fn test_size_estimate() {
        let d = EncodingDescriptor::video("22", 720).with_bitrate(1000.0);
        // 1000 kbps for 10 s = 1 250 000 bytes
        assert_eq!(d.size_or_estimate(10.0), Some(1_250_000));
        assert_eq!(d.size_or_estimate(0.0), None);
    }

    #[test]
    fn test_known_size_wins_over_estimate() {
        let d = EncodingDescriptor::video("22", 720)
            .with_bitrate(1000.0)
            .with_file_size(42);
        assert_eq!(d.size_or_estimate(10.0), Some(42));
    }

    #[test]
    fn test_no_bitrate_no_estimate() {
        let d = EncodingDescriptor::video("22", 720);
        assert_eq!(d.size_or_estimate(120.0), None);
    }
}
