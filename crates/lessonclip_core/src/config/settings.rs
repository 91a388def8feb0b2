//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::models::{FrameRate, Orientation, TimelinePadding};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Re-encode targets.
    #[serde(default)]
    pub encoding: EncodingSettings,

    /// Audio timeline defaults.
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// Short-form batching.
    #[serde(default)]
    pub shorts: ShortsSettings,

    /// Worker pool.
    #[serde(default)]
    pub workers: WorkerSettings,
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for finished artifacts.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder under which each job gets its own temporary directory.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "lesson_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (tool output only kept in the tail buffer).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show on error.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log every ffmpeg/ffprobe command line.
    #[serde(default = "default_true")]
    pub show_commands: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_commands: true,
        }
    }
}

/// Locations of the external media tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable (name on PATH or absolute path).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// ffprobe executable (name on PATH or absolute path).
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Targets used whenever a stream has to be re-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingSettings {
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Constant-quality factor; 18 is visually lossless for x264.
    #[serde(default = "default_crf")]
    pub crf: u32,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// Frame rate every input is forced to on the normalized concat path.
    #[serde(default = "default_normalized_fps")]
    pub normalized_fps: u32,

    /// Sample rate of normalized audio.
    #[serde(default = "default_normalized_sample_rate")]
    pub normalized_sample_rate_hz: u32,

    /// Channel count of normalized audio.
    #[serde(default = "default_normalized_channels")]
    pub normalized_channels: u32,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_crf() -> u32 {
    18
}

fn default_preset() -> String {
    "veryslow".to_string()
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> u32 {
    256
}

fn default_normalized_fps() -> u32 {
    25
}

fn default_normalized_sample_rate() -> u32 {
    48000
}

fn default_normalized_channels() -> u32 {
    2
}

impl EncodingSettings {
    pub fn normalized_frame_rate(&self) -> FrameRate {
        FrameRate::fps(self.normalized_fps)
    }
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            crf: default_crf(),
            preset: default_preset(),
            pixel_format: default_pixel_format(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            normalized_fps: default_normalized_fps(),
            normalized_sample_rate_hz: default_normalized_sample_rate(),
            normalized_channels: default_normalized_channels(),
        }
    }
}

/// Defaults for repeated-speech timelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSettings {
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,

    #[serde(default = "default_start_silence")]
    pub start_silence_seconds: f64,

    #[serde(default = "default_gap_silence")]
    pub gap_silence_seconds: f64,

    #[serde(default = "default_end_silence")]
    pub end_silence_seconds: f64,
}

fn default_repeat_count() -> u32 {
    3
}

fn default_start_silence() -> f64 {
    1.0
}

fn default_gap_silence() -> f64 {
    0.5
}

fn default_end_silence() -> f64 {
    1.0
}

impl TimelineSettings {
    pub fn padding(&self) -> TimelinePadding {
        TimelinePadding::new(
            self.start_silence_seconds,
            self.gap_silence_seconds,
            self.end_silence_seconds,
        )
    }
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            repeat_count: default_repeat_count(),
            start_silence_seconds: default_start_silence(),
            gap_silence_seconds: default_gap_silence(),
            end_silence_seconds: default_end_silence(),
        }
    }
}

/// Short-form output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortsSettings {
    /// Maximum combined duration of one batch, in seconds.
    #[serde(default = "default_max_batch_seconds")]
    pub max_batch_seconds: f64,

    /// How a short's companion video is stacked onto the clip.
    #[serde(default)]
    pub orientation: Orientation,
}

fn default_max_batch_seconds() -> f64 {
    180.0
}

impl Default for ShortsSettings {
    fn default() -> Self {
        Self {
            max_batch_seconds: default_max_batch_seconds(),
            orientation: Orientation::default(),
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Number of jobs processed concurrently.
    #[serde(default = "default_worker_count")]
    pub count: usize,

    /// Keep each job's temporary directory after the job finishes.
    #[serde(default)]
    pub keep_temp: bool,
}

fn default_worker_count() -> usize {
    2
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            keep_temp: false,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Tools,
    Encoding,
    Timeline,
    Shorts,
    Workers,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 7] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Tools,
        ConfigSection::Encoding,
        ConfigSection::Timeline,
        ConfigSection::Shorts,
        ConfigSection::Workers,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Tools => "tools",
            ConfigSection::Encoding => "encoding",
            ConfigSection::Timeline => "timeline",
            ConfigSection::Shorts => "shorts",
            ConfigSection::Workers => "workers",
        }
    }

    /// Comment written above the section in a generated file.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output, temp and log directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Tools => "External media tools",
            ConfigSection::Encoding => "Re-encode targets (used only when a stream cannot be copied)",
            ConfigSection::Timeline => "Repeated speech timeline defaults",
            ConfigSection::Shorts => "Short-form batching",
            ConfigSection::Workers => "Job worker pool",
        }
    }
}
