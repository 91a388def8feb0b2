//! Probed media descriptions (assets, video and audio stream parameters).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Exact frame rate as a rational number (e.g. `30000/1001`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Whole-number frame rate (`25/1`).
    pub fn fps(fps: u32) -> Self {
        Self { num: fps, den: 1 }
    }

    /// Parse ffprobe's `num/den` notation. Returns `None` for `0/0`.
    pub fn parse(value: &str) -> Option<Self> {
        let (num, den) = match value.split_once('/') {
            Some((n, d)) => (n.trim().parse().ok()?, d.trim().parse().ok()?),
            None => (value.trim().parse().ok()?, 1),
        };
        if num == 0 || den == 0 {
            return None;
        }
        Some(Self { num, den })
    }

    /// Compare as rationals, so `50/2` equals `25/1`.
    pub fn same_rate(&self, other: &FrameRate) -> bool {
        self.num as u64 * other.den as u64 == other.num as u64 * self.den as u64
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Parameters of the first video stream of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoParams {
    /// Codec name as reported by ffprobe (e.g. "h264").
    pub codec: String,
    pub width: u32,
    pub height: u32,
    /// Pixel format (e.g. "yuv420p").
    pub pixel_format: String,
    pub frame_rate: Option<FrameRate>,
}

impl VideoParams {
    /// Codec, resolution and frame rate all match.
    pub fn is_join_compatible(&self, other: &VideoParams) -> bool {
        let rates_match = match (&self.frame_rate, &other.frame_rate) {
            (Some(a), Some(b)) => a.same_rate(b),
            (None, None) => true,
            _ => false,
        };
        self.codec == other.codec
            && self.width == other.width
            && self.height == other.height
            && rates_match
    }
}

/// Parameters of the first audio stream of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioParams {
    /// Codec name as reported by ffprobe (e.g. "aac").
    pub codec: String,
    pub channel_count: u32,
    pub sample_rate_hz: u32,
    /// Stream duration when the container reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl AudioParams {
    /// Codec, channel count and sample rate all match.
    pub fn is_join_compatible(&self, other: &AudioParams) -> bool {
        self.codec == other.codec
            && self.channel_count == other.channel_count
            && self.sample_rate_hz == other.sample_rate_hz
    }

    /// ffmpeg channel layout name for this channel count.
    pub fn channel_layout(&self) -> String {
        channel_layout_name(self.channel_count)
    }
}

/// ffmpeg channel layout name for a channel count.
pub fn channel_layout_name(channels: u32) -> String {
    match channels {
        1 => "mono".to_string(),
        2 => "stereo".to_string(),
        6 => "5.1".to_string(),
        8 => "7.1".to_string(),
        n => format!("{}c", n),
    }
}

/// A probed media file.
///
/// Immutable once probed. If the file on disk changes, probe it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioParams>,
}

impl MediaAsset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// An audio stream exists and is not reported as zero-length.
    pub fn has_nonempty_audio(&self) -> bool {
        match &self.audio {
            Some(audio) => audio.duration_seconds.map_or(true, |d| d > 0.0),
            None => false,
        }
    }

    /// One-line parameter dump used in error diagnostics.
    pub fn summary(&self) -> String {
        let video = match &self.video {
            Some(v) => format!(
                "video={} {}x{} {} @{}",
                v.codec,
                v.width,
                v.height,
                v.pixel_format,
                v.frame_rate
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "?".to_string())
            ),
            None => "video=none".to_string(),
        };
        let audio = match &self.audio {
            Some(a) => format!(
                "audio={} {}ch {}Hz",
                a.codec, a.channel_count, a.sample_rate_hz
            ),
            None => "audio=none".to_string(),
        };
        format!(
            "{} [{:.3}s, {}, {}]",
            self.path.display(),
            self.duration_seconds,
            video,
            audio
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn video(codec: &str, width: u32, height: u32, fps: u32) -> VideoParams {
        VideoParams {
            codec: codec.to_string(),
            width,
            height,
            pixel_format: "yuv420p".to_string(),
            frame_rate: Some(FrameRate::fps(fps)),
        }
    }

    pub fn audio(codec: &str, channels: u32, rate: u32) -> AudioParams {
        AudioParams {
            codec: codec.to_string(),
            channel_count: channels,
            sample_rate_hz: rate,
            duration_seconds: None,
        }
    }

    /// 1080p h264/aac clip of the given duration.
    pub fn clip(path: &str, duration: f64) -> MediaAsset {
        MediaAsset {
            path: PathBuf::from(path),
            duration_seconds: duration,
            video: Some(video("h264", 1920, 1080, 25)),
            audio: Some(audio("aac", 2, 48000)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_parses_ffprobe_notation() {
        assert_eq!(FrameRate::parse("30000/1001"), Some(FrameRate::new(30000, 1001)));
        assert_eq!(FrameRate::parse("25"), Some(FrameRate::fps(25)));
        assert_eq!(FrameRate::parse("0/0"), None);
        assert_eq!(FrameRate::parse("abc"), None);
    }

    #[test]
    fn frame_rates_compare_as_rationals() {
        assert!(FrameRate::new(50, 2).same_rate(&FrameRate::fps(25)));
        assert!(!FrameRate::new(30000, 1001).same_rate(&FrameRate::fps(30)));
    }

    #[test]
    fn zero_length_audio_is_empty() {
        let mut asset = fixtures::clip("/a.mp4", 3.0);
        assert!(asset.has_nonempty_audio());

        asset.audio.as_mut().unwrap().duration_seconds = Some(0.0);
        assert!(asset.has_audio());
        assert!(!asset.has_nonempty_audio());
    }

    #[test]
    fn summary_lists_parameters() {
        let summary = fixtures::clip("/a.mp4", 3.0).summary();
        assert!(summary.contains("h264 1920x1080"));
        assert!(summary.contains("48000Hz"));
    }

    #[test]
    fn channel_layout_names() {
        assert_eq!(fixtures::audio("aac", 1, 44100).channel_layout(), "mono");
        assert_eq!(fixtures::audio("aac", 2, 44100).channel_layout(), "stereo");
        assert_eq!(fixtures::audio("aac", 3, 44100).channel_layout(), "3c");
    }
}
