//! Copy-versus-re-encode decisions.
//!
//! A stream is stream-copied only when no filter touches it in the current
//! operation. Anything filtered is re-encoded with the configured targets.

use crate::config::EncodingSettings;
use crate::models::{FrameRate, MediaAsset, StreamKind};

/// Which streams an operation runs through a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterUse {
    pub video: bool,
    pub audio: bool,
}

impl FilterUse {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn video() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }

    pub fn audio() -> Self {
        Self {
            video: false,
            audio: true,
        }
    }

    pub fn both() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }

    pub fn touches(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Video => self.video,
            StreamKind::Audio => self.audio,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoTarget {
    pub codec: String,
    pub crf: u32,
    pub preset: String,
    pub pixel_format: String,
    /// Forced output frame rate, if any.
    pub frame_rate: Option<FrameRate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioTarget {
    pub codec: String,
    pub bitrate_kbps: u32,
    pub sample_rate_hz: Option<u32>,
    pub channels: Option<u32>,
}

/// How one output stream is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeSpec {
    Copy(StreamKind),
    Video(VideoTarget),
    Audio(AudioTarget),
}

impl EncodeSpec {
    pub fn is_copy(&self) -> bool {
        matches!(self, EncodeSpec::Copy(_))
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            EncodeSpec::Copy(kind) => *kind,
            EncodeSpec::Video(_) => StreamKind::Video,
            EncodeSpec::Audio(_) => StreamKind::Audio,
        }
    }

    /// ffmpeg output options for this stream.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            EncodeSpec::Copy(kind) => {
                args.push(format!("-c:{}", kind.specifier()));
                args.push("copy".to_string());
            }
            EncodeSpec::Video(target) => {
                args.extend([
                    "-c:v".to_string(),
                    target.codec.clone(),
                    "-crf".to_string(),
                    target.crf.to_string(),
                    "-preset".to_string(),
                    target.preset.clone(),
                    "-pix_fmt".to_string(),
                    target.pixel_format.clone(),
                ]);
                if let Some(rate) = target.frame_rate {
                    args.push("-r".to_string());
                    args.push(rate.to_string());
                }
            }
            EncodeSpec::Audio(target) => {
                args.extend([
                    "-c:a".to_string(),
                    target.codec.clone(),
                    "-b:a".to_string(),
                    format!("{}k", target.bitrate_kbps),
                ]);
                if let Some(rate) = target.sample_rate_hz {
                    args.push("-ar".to_string());
                    args.push(rate.to_string());
                }
                if let Some(channels) = target.channels {
                    args.push("-ac".to_string());
                    args.push(channels.to_string());
                }
            }
        }
        args
    }
}

/// Decides per stream whether to copy or re-encode, and with what targets.
#[derive(Debug, Clone, Default)]
pub struct EncodeParameterResolver {
    settings: EncodingSettings,
}

impl EncodeParameterResolver {
    pub fn new(settings: EncodingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EncodingSettings {
        &self.settings
    }

    pub fn can_copy_video(&self, asset: &MediaAsset, filters: FilterUse) -> bool {
        asset.has_video() && !filters.video
    }

    pub fn can_copy_audio(&self, asset: &MediaAsset, filters: FilterUse) -> bool {
        asset.has_audio() && !filters.audio
    }

    /// Copy when unfiltered, otherwise the configured video target at the
    /// source's own frame rate.
    pub fn resolve_video_params(&self, source: &MediaAsset, filters: FilterUse) -> EncodeSpec {
        if self.can_copy_video(source, filters) {
            EncodeSpec::Copy(StreamKind::Video)
        } else {
            EncodeSpec::Video(self.video_target(None))
        }
    }

    /// Video target forced to the normalized frame rate.
    pub fn normalized_video(&self) -> EncodeSpec {
        EncodeSpec::Video(self.video_target(Some(self.settings.normalized_frame_rate())))
    }

    /// Audio re-encode target. With `normalize` the output is forced to the
    /// normalized rate and channel count (48 kHz stereo by default).
    pub fn resolve_audio_params(&self, normalize: bool) -> EncodeSpec {
        let (sample_rate_hz, channels) = if normalize {
            (
                Some(self.settings.normalized_sample_rate_hz),
                Some(self.settings.normalized_channels),
            )
        } else {
            (None, None)
        };
        EncodeSpec::Audio(AudioTarget {
            codec: self.settings.audio_codec.clone(),
            bitrate_kbps: self.settings.audio_bitrate_kbps,
            sample_rate_hz,
            channels,
        })
    }

    /// Copy when unfiltered, otherwise a non-normalized re-encode.
    pub fn resolve_audio_for(&self, source: &MediaAsset, filters: FilterUse) -> EncodeSpec {
        if self.can_copy_audio(source, filters) {
            EncodeSpec::Copy(StreamKind::Audio)
        } else {
            self.resolve_audio_params(false)
        }
    }

    fn video_target(&self, frame_rate: Option<FrameRate>) -> VideoTarget {
        VideoTarget {
            codec: self.settings.video_codec.clone(),
            crf: self.settings.crf,
            preset: self.settings.preset.clone(),
            pixel_format: self.settings.pixel_format.clone(),
            frame_rate,
        }
    }
}
