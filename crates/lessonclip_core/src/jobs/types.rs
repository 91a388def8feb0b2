//! Job specifications and outcomes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{Orientation, TimeRange, TimelinePadding};

/// Still slide shown under the repeated speech audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideSpec {
    /// Background image (already rendered by the slide designer).
    pub background: PathBuf,
    /// Synthesized speech for the expression.
    pub speech_audio: PathBuf,
    /// Overrides `[timeline] repeat_count`.
    #[serde(default)]
    pub repeat_count: Option<u32>,
    /// Overrides the `[timeline]` silences.
    #[serde(default)]
    pub padding: Option<TimelinePadding>,
}

/// Companion video stacked onto the finished clip to make a short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortFormSpec {
    pub companion: PathBuf,
    /// Overrides `[shorts] orientation`.
    #[serde(default)]
    pub orientation: Option<Orientation>,
    pub output: PathBuf,
}

/// One expression: context clip, repeated expression, optional slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionJob {
    pub source: PathBuf,
    /// Subtitle track of the whole source, in source time.
    #[serde(default)]
    pub subtitles: Option<PathBuf>,
    pub context_window: TimeRange,
    pub expression_window: TimeRange,
    /// Overrides `[timeline] repeat_count` for the repeated expression.
    #[serde(default)]
    pub repeat_count: Option<u32>,
    #[serde(default)]
    pub slide: Option<SlideSpec>,
    #[serde(default = "default_gain")]
    pub gain: f64,
    pub output: PathBuf,
    #[serde(default)]
    pub short_form: Option<ShortFormSpec>,
}

fn default_gain() -> f64 {
    1.0
}

impl ExpressionJob {
    pub fn new(
        source: impl Into<PathBuf>,
        context_window: TimeRange,
        expression_window: TimeRange,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            subtitles: None,
            context_window,
            expression_window,
            repeat_count: None,
            slide: None,
            gain: default_gain(),
            output: output.into(),
            short_form: None,
        }
    }
}

/// Whole-episode assembly from finished clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeJob {
    /// Structured clips in playback order.
    #[serde(default)]
    pub clips: Vec<PathBuf>,
    pub episode_output: PathBuf,
    /// Short-form clips in playback order.
    #[serde(default)]
    pub shorts: Vec<PathBuf>,
    pub shorts_output_dir: PathBuf,
    /// Batch files are named `<prefix>_01.mp4`, `<prefix>_02.mp4`, ...
    #[serde(default = "default_shorts_prefix")]
    pub shorts_prefix: String,
}

fn default_shorts_prefix() -> String {
    "shorts".to_string()
}

impl EpisodeJob {
    /// Output path of the `index`-th (0-based) short-form batch.
    pub fn batch_output(&self, index: usize) -> PathBuf {
        self.shorts_output_dir
            .join(format!("{}_{:02}.mp4", self.shorts_prefix, index + 1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobSpec {
    Expression(ExpressionJob),
    Episode(EpisodeJob),
}

impl JobSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            JobSpec::Expression(_) => "expression",
            JobSpec::Episode(_) => "episode",
        }
    }
}

/// A job waiting in (or taken from) the pool queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: String,
    /// Display name.
    pub name: String,
    pub spec: JobSpec,
}

impl JobEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, spec: JobSpec) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            spec,
        }
    }
}

/// Final status of a processed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Result of processing one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    /// Caller-visible files written by the job, in creation order.
    pub outputs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

impl JobOutcome {
    pub fn complete(
        job_id: impl Into<String>,
        outputs: Vec<PathBuf>,
        steps_completed: Vec<String>,
        steps_skipped: Vec<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Complete,
            outputs,
            error: None,
            steps_completed,
            steps_skipped,
        }
    }

    pub fn failed(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Failed,
            outputs: Vec::new(),
            error: Some(error.into()),
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        }
    }

    pub fn cancelled(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Cancelled,
            outputs: Vec::new(),
            error: None,
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Complete
    }
}
