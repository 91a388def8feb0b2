//! Job processor: turns a queued job into a pipeline run.
//!
//! For each job the processor creates the per-job logger and context, picks
//! the pipeline for the job kind, runs it, and releases the job workspace
//! on every exit path.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::context::{CancelHandle, JobContext};
use crate::jobs::{JobEntry, JobHandler, JobOutcome, JobSpec};
use crate::logging::{JobLogger, LogCallback, LogConfig};
use crate::tools::{SystemToolRunner, ToolRunner};

use super::collaborators::{SlideComposer, SubtitleBurner};
use super::errors::PipelineError;
use super::types::{Context, JobState};
use super::{create_episode_pipeline, create_expression_pipeline, Pipeline};

/// Receives `(job_id, log_line)` for every job.
pub type JobLogSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Receives `(job_id, step_name, percent)` for every job.
pub type JobProgressSink = Arc<dyn Fn(&str, &str, u32) + Send + Sync>;

pub struct JobProcessor {
    settings: Arc<Settings>,
    runner: Arc<dyn ToolRunner>,
    subtitle_burner: Option<Arc<dyn SubtitleBurner>>,
    slide_composer: Option<Arc<dyn SlideComposer>>,
    log_sink: Option<JobLogSink>,
    progress_sink: Option<JobProgressSink>,
}

impl JobProcessor {
    pub fn new(settings: Settings, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            settings: Arc::new(settings),
            runner,
            subtitle_burner: None,
            slide_composer: None,
            log_sink: None,
            progress_sink: None,
        }
    }

    /// Processor running the configured `ffmpeg`/`ffprobe` executables.
    pub fn with_system_tools(settings: Settings) -> Self {
        let runner = Arc::new(SystemToolRunner::new(&settings.tools));
        Self::new(settings, runner)
    }

    pub fn with_subtitle_burner(mut self, burner: Arc<dyn SubtitleBurner>) -> Self {
        self.subtitle_burner = Some(burner);
        self
    }

    pub fn with_slide_composer(mut self, composer: Arc<dyn SlideComposer>) -> Self {
        self.slide_composer = Some(composer);
        self
    }

    pub fn with_log_sink(mut self, sink: JobLogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn with_progress_sink(mut self, sink: JobProgressSink) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Pipeline for a job kind.
    pub fn pipeline_for(spec: &JobSpec) -> Pipeline {
        match spec {
            JobSpec::Expression(_) => create_expression_pipeline(),
            JobSpec::Episode(_) => create_episode_pipeline(),
        }
    }

    /// Run one job to completion.
    pub fn process_job(&self, entry: &JobEntry, cancel: CancelHandle) -> JobOutcome {
        let logger = match self.create_logger(entry) {
            Ok(logger) => Arc::new(logger),
            Err(e) => {
                tracing::error!("Job {}: failed to create logger: {}", entry.id, e);
                return JobOutcome::failed(&entry.id, format!("Failed to create logger: {}", e));
            }
        };

        let job = match JobContext::new(
            &entry.id,
            Arc::clone(&self.settings),
            Arc::clone(&self.runner),
            Arc::clone(&logger),
            cancel,
        ) {
            Ok(job) => job,
            Err(e) => {
                let error = PipelineError::setup_failed(&entry.name, e.to_string());
                logger.error(&error.to_string());
                logger.close();
                return JobOutcome::failed(&entry.id, error.to_string());
            }
        };

        let ctx = self.create_context(job, entry);
        let pipeline = Self::pipeline_for(&entry.spec);
        let mut state = JobState::new(&entry.id);

        logger.info(&format!(
            "Starting {} job '{}' ({} steps)",
            entry.spec.kind(),
            entry.name,
            pipeline.step_count()
        ));
        let result = pipeline.run(&ctx, &mut state);
        let outputs: Vec<PathBuf> = state.outputs();

        if let Err(e) = ctx.finish() {
            logger.warn(&format!("Workspace cleanup failed: {}", e));
        }

        let outcome = match result {
            Ok(run) => {
                logger.success(&format!("Job complete: {} output file(s)", outputs.len()));
                JobOutcome::complete(&entry.id, outputs, run.steps_completed, run.steps_skipped)
            }
            Err(e) if e.is_cancelled() => {
                logger.warn("Job cancelled");
                JobOutcome::cancelled(&entry.id)
            }
            Err(e) => {
                let message = e.to_string();
                logger.error(&format!("Job failed: {}", message));
                JobOutcome::failed(&entry.id, message)
            }
        };
        logger.close();
        outcome
    }

    fn create_logger(&self, entry: &JobEntry) -> std::io::Result<JobLogger> {
        let callback: Option<LogCallback> = self.log_sink.as_ref().map(|sink| {
            let sink = Arc::clone(sink);
            let job_id = entry.id.clone();
            Box::new(move |line: &str| sink(&job_id, line)) as LogCallback
        });
        JobLogger::new(
            &entry.id,
            &self.settings.paths.logs_folder,
            LogConfig::from_settings(&self.settings.logging),
            callback,
        )
    }

    fn create_context(&self, job: JobContext, entry: &JobEntry) -> Context {
        let mut ctx = Context::new(job, &entry.name, entry.spec.clone());
        if let Some(ref burner) = self.subtitle_burner {
            ctx = ctx.with_subtitle_burner(Arc::clone(burner));
        }
        if let Some(ref composer) = self.slide_composer {
            ctx = ctx.with_slide_composer(Arc::clone(composer));
        }
        if let Some(ref sink) = self.progress_sink {
            let sink = Arc::clone(sink);
            let job_id = entry.id.clone();
            ctx = ctx.with_progress_callback(Box::new(
                move |step: &str, percent: u32, _message: &str| sink(&job_id, step, percent),
            ));
        }
        ctx
    }
}

impl JobHandler for JobProcessor {
    fn process(&self, entry: &JobEntry, cancel: &CancelHandle) -> JobOutcome {
        self.process_job(entry, cancel.clone())
    }
}
