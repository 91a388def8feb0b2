//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::collaborators::{
    FfmpegSubtitleBurner, SlideComposer, StillImageSlideComposer, SubtitleBurner,
};
use super::errors::{StepError, StepResult};
use crate::config::Settings;
use crate::context::JobContext;
use crate::error::ComposeResult;
use crate::jobs::{EpisodeJob, ExpressionJob, JobSpec};
use crate::logging::JobLogger;
use crate::models::{CompositionSegment, MediaAsset};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Mutable state goes in `JobState`.
pub struct Context {
    /// Engine context: workspace, cancel flag, logger, settings, runner.
    pub job: JobContext,
    /// What to build.
    pub spec: JobSpec,
    /// Job name (for error context).
    pub job_name: String,
    subtitle_burner: Arc<dyn SubtitleBurner>,
    slide_composer: Arc<dyn SlideComposer>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a context using the plain ffmpeg collaborators.
    pub fn new(job: JobContext, job_name: impl Into<String>, spec: JobSpec) -> Self {
        Self {
            job,
            spec,
            job_name: job_name.into(),
            subtitle_burner: Arc::new(FfmpegSubtitleBurner),
            slide_composer: Arc::new(StillImageSlideComposer),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_subtitle_burner(mut self, burner: Arc<dyn SubtitleBurner>) -> Self {
        self.subtitle_burner = burner;
        self
    }

    pub fn with_slide_composer(mut self, composer: Arc<dyn SlideComposer>) -> Self {
        self.slide_composer = composer;
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    pub fn logger(&self) -> &JobLogger {
        self.job.logger()
    }

    pub fn settings(&self) -> &Settings {
        self.job.settings()
    }

    pub fn subtitle_burner(&self) -> &dyn SubtitleBurner {
        self.subtitle_burner.as_ref()
    }

    pub fn slide_composer(&self) -> &dyn SlideComposer {
        self.slide_composer.as_ref()
    }

    pub fn expression(&self) -> StepResult<&ExpressionJob> {
        match &self.spec {
            JobSpec::Expression(job) => Ok(job),
            other => Err(StepError::invalid_input(format!(
                "expected an expression job, got {}",
                other.kind()
            ))),
        }
    }

    pub fn episode(&self) -> StepResult<&EpisodeJob> {
        match &self.spec {
            JobSpec::Episode(job) => Ok(job),
            other => Err(StepError::invalid_input(format!(
                "expected an episode job, got {}",
                other.kind()
            ))),
        }
    }

    /// Path of an intermediate file in the job workspace.
    pub fn work_file(&self, name: &str) -> PathBuf {
        self.job.workspace().file(name)
    }

    /// Workspace file named `stem` with the extension of `destination`.
    pub fn work_file_like(&self, stem: &str, destination: &Path) -> PathBuf {
        let extension = destination
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        self.work_file(&format!("{}.{}", stem, extension))
    }

    /// Release the workspace.
    pub fn finish(self) -> ComposeResult<()> {
        self.job.finish()
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Steps add their own section and do not overwrite earlier ones. Every
/// media file recorded here lives in the job workspace until the Deliver
/// step moves the entries of `deliveries` to their caller paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: String,
    pub started_at: Option<String>,
    /// Probed source video (Probe step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MediaAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_clip: Option<CompositionSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeated: Option<CompositionSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide: Option<CompositionSegment>,
    /// All segments joined, before gain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembled: Option<MediaAsset>,
    /// Stacked short, before gain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<MediaAsset>,
    /// Assembled clip after gain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<MediaAsset>,
    /// Stacked short after gain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_short: Option<MediaAsset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<MediaAsset>,
    #[serde(default)]
    pub short_batches: Vec<BatchOutput>,
    /// Shorts longer than the batch budget on their own.
    #[serde(default)]
    pub oversized_shorts: Vec<PathBuf>,
    /// Finished workspace files and where they go, in output order.
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    /// Caller paths written by the Deliver step.
    #[serde(default)]
    pub delivered: Vec<PathBuf>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn require_source(&self) -> StepResult<&MediaAsset> {
        self.source
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("source has not been probed"))
    }

    pub fn require_assembled(&self) -> StepResult<&MediaAsset> {
        self.assembled
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("segments have not been assembled"))
    }

    pub fn require_final(&self) -> StepResult<&MediaAsset> {
        self.final_output
            .as_ref()
            .ok_or_else(|| StepError::precondition_failed("final output has not been written"))
    }

    /// Segments in playback order: context, repeated expression, slide.
    pub fn segments(&self) -> Vec<&CompositionSegment> {
        [&self.context_clip, &self.repeated, &self.slide]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Rendered files of all segments, in playback order.
    pub fn rendered_segments(&self) -> StepResult<Vec<MediaAsset>> {
        self.segments()
            .into_iter()
            .map(|segment| {
                segment.rendered.clone().ok_or_else(|| {
                    StepError::precondition_failed(format!(
                        "{} segment has not been rendered",
                        segment.label()
                    ))
                })
            })
            .collect()
    }

    /// Queue a finished workspace file for delivery to `destination`.
    pub fn deliver_later(&mut self, rendered: MediaAsset, destination: impl Into<PathBuf>) {
        self.deliveries.push(Delivery {
            rendered,
            destination: destination.into(),
        });
    }

    /// First queued delivery whose workspace file is gone.
    pub fn missing_delivery(&self) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| !d.rendered.path.exists())
    }

    /// Caller-visible files. Empty until every step has succeeded.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.delivered.clone()
    }
}

/// A finished workspace file and the caller path it belongs at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub rendered: MediaAsset,
    pub destination: PathBuf,
}

/// One rendered short-form batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutput {
    /// Caller path the batch is delivered to.
    pub path: PathBuf,
    pub duration_seconds: f64,
    /// Shorts joined into this batch, in order.
    pub members: Vec<PathBuf>,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (not requested by the job, not an error).
    Skipped(String),
}
