//! Probe step - reads the source video's parameters.

use super::require_file;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::probe::probe;

pub struct ProbeStep;

impl ProbeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProbeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ProbeStep {
    fn name(&self) -> &str {
        "Probe"
    }

    fn description(&self) -> &str {
        "Probe the source video"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let job = ctx.expression()?;
        require_file(&job.source)?;
        if let Some(ref srt) = job.subtitles {
            require_file(srt)?;
        }
        for (label, window) in [
            ("context", job.context_window),
            ("expression", job.expression_window),
        ] {
            if !window.is_valid() {
                return Err(StepError::invalid_input(format!(
                    "{} window {:.3}-{:.3}s is empty or negative",
                    label, window.start_seconds, window.end_seconds
                )));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let job = ctx.expression()?;
        let source = probe(&ctx.job, &job.source)?;
        ctx.logger().info(&format!("Source: {}", source.summary()));

        if !source.has_video() {
            return Err(StepError::invalid_input(format!(
                "{} has no video stream",
                source.path.display()
            )));
        }
        if !source.has_nonempty_audio() {
            ctx.logger()
                .warn("Source has no audio; clips will be silent");
        }

        state.source = Some(source);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        state.require_source().map(|_| ())
    }
}
