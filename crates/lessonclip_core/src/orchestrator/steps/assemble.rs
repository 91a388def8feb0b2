//! Assemble step - joins the rendered segments in playback order.

use crate::compose::concatenate;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct AssembleStep;

impl AssembleStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AssembleStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for AssembleStep {
    fn name(&self) -> &str {
        "Assemble"
    }

    fn description(&self) -> &str {
        "Join context clip, repeated expression and slide"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        ctx.expression().map(|_| ())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let inputs = state.rendered_segments()?;
        if inputs.is_empty() {
            return Err(StepError::precondition_failed("no segments to assemble"));
        }

        let expected: f64 = inputs.iter().map(|a| a.duration_seconds).sum();
        let assembled = concatenate(&ctx.job, &inputs, &ctx.work_file("assembled.mp4"))?;
        ctx.logger().info(&format!(
            "Assembled {} segment(s): {:.3}s (segments sum to {:.3}s)",
            inputs.len(),
            assembled.duration_seconds,
            expected
        ));

        state.assembled = Some(assembled);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let assembled = state.require_assembled()?;
        if !assembled.path.exists() {
            return Err(StepError::invalid_output(format!(
                "assembled file missing: {}",
                assembled.path.display()
            )));
        }
        Ok(())
    }
}
