//! ShortForm step - stacks a companion video onto the assembled clip.
//!
//! The stacked file stays in the workspace; Gain runs over it afterwards.

use super::require_file;
use crate::compose::stack;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::probe::probe;

pub struct ShortFormStep;

impl ShortFormStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShortFormStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ShortFormStep {
    fn name(&self) -> &str {
        "ShortForm"
    }

    fn description(&self) -> &str {
        "Stack the short-form companion onto the clip"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        match ctx.expression()?.short_form {
            Some(ref short) => require_file(&short.companion),
            None => Ok(()),
        }
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let Some(ref short) = ctx.expression()?.short_form else {
            return Ok(StepOutcome::Skipped("no short-form companion".to_string()));
        };
        let clip = state.require_assembled()?;
        let companion = probe(&ctx.job, &short.companion)?;
        let orientation = short
            .orientation
            .unwrap_or(ctx.settings().shorts.orientation);

        let output = ctx.work_file_like("short_stacked", &short.output);
        let stacked = stack(&ctx.job, clip, &companion, orientation, &output)?;
        ctx.logger().info(&format!(
            "Stacked short ({:.3}s, {:?})",
            stacked.duration_seconds, orientation
        ));

        state.short = Some(stacked);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.short {
            Some(ref short) if short.path.exists() => Ok(()),
            _ => Err(StepError::invalid_output("short was not written")),
        }
    }
}
