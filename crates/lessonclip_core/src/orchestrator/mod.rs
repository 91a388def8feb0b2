//! Pipeline orchestrator for coordinating job execution.
//!
//! Each job runs as a sequence of steps that validate, execute, and record
//! their results in a [`JobState`].
//!
//! # Architecture
//!
//! ```text
//! Expression pipeline               Episode pipeline
//!     ├── Step: Probe                   ├── Step: Episode
//!     ├── Step: ContextClip             ├── Step: ShortBatches
//!     ├── Step: RepeatedExpression      └── Step: Deliver
//!     ├── Step: Slide        (optional)
//!     ├── Step: Assemble
//!     ├── Step: ShortForm    (optional)
//!     ├── Step: Gain
//!     └── Step: Deliver
//! ```
//!
//! Steps render into the job workspace. Only Deliver writes to caller
//! paths, so a failed or cancelled job leaves no outputs behind.
//!
//! # Example
//!
//! ```no_run
//! use lessonclip_core::config::Settings;
//! use lessonclip_core::context::CancelHandle;
//! use lessonclip_core::jobs::{ExpressionJob, JobEntry, JobSpec};
//! use lessonclip_core::models::TimeRange;
//! use lessonclip_core::orchestrator::JobProcessor;
//!
//! let job = ExpressionJob::new(
//!     "episode.mp4",
//!     TimeRange::new(118.0, 131.0),
//!     TimeRange::new(120.5, 122.0),
//!     "out/expr_0001.mp4",
//! );
//! let entry = JobEntry::new("expr-0001", "expr_0001", JobSpec::Expression(job));
//! let outcome = JobProcessor::with_system_tools(Settings::default())
//!     .process_job(&entry, CancelHandle::new());
//! println!("{:?}: {:?}", outcome.status, outcome.outputs);
//! ```

mod collaborators;
mod errors;
mod pipeline;
mod processor;
mod step;
pub mod steps;
mod types;

pub use collaborators::{
    FfmpegSubtitleBurner, SlideComposer, StillImageSlideComposer, SubtitleBurner,
};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use processor::{JobLogSink, JobProcessor, JobProgressSink};
pub use step::PipelineStep;
pub use steps::{
    AssembleStep, ContextClipStep, DeliverStep, EpisodeStep, GainStep, ProbeStep,
    RepeatedExpressionStep, ShortBatchesStep, ShortFormStep, SlideStep,
};
pub use types::{BatchOutput, Context, Delivery, JobState, ProgressCallback, StepOutcome};

/// Pipeline for one expression.
///
/// 1. Probe - read the source parameters
/// 2. ContextClip - cut the context window, realign and burn subtitles
/// 3. RepeatedExpression - cut the expression and repeat it
/// 4. Slide - timeline audio under a still background (optional)
/// 5. Assemble - join the segments
/// 6. ShortForm - stack a companion video (optional)
/// 7. Gain - final volume on the clip and the short
/// 8. Deliver - move the results to the job's output paths
pub fn create_expression_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(ProbeStep::new())
        .with_step(ContextClipStep::new())
        .with_step(RepeatedExpressionStep::new())
        .with_step(SlideStep::new())
        .with_step(AssembleStep::new())
        .with_step(ShortFormStep::new())
        .with_step(GainStep::new())
        .with_step(DeliverStep::new())
}

/// Pipeline for a whole episode: the full join, short-form batches, then
/// delivery of both.
pub fn create_episode_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(EpisodeStep::new())
        .with_step(ShortBatchesStep::new())
        .with_step(DeliverStep::new())
}
