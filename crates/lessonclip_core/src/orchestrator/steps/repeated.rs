//! RepeatedExpression step - the expression played N times back to back.

use crate::compose::{concatenate, slice};
use crate::models::{CompositionSegment, SegmentKind};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct RepeatedExpressionStep;

impl RepeatedExpressionStep {
    pub fn new() -> Self {
        Self
    }

    fn repeat_count(ctx: &Context) -> StepResult<u32> {
        let job = ctx.expression()?;
        Ok(job
            .repeat_count
            .unwrap_or(ctx.settings().timeline.repeat_count))
    }
}

impl Default for RepeatedExpressionStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for RepeatedExpressionStep {
    fn name(&self) -> &str {
        "RepeatedExpression"
    }

    fn description(&self) -> &str {
        "Cut the expression and repeat it"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if Self::repeat_count(ctx)? == 0 {
            return Err(StepError::invalid_input("repeat count must be at least 1"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let job = ctx.expression()?;
        let source = state.require_source()?;
        let count = Self::repeat_count(ctx)?;

        let expression = slice(
            &ctx.job,
            source,
            job.expression_window,
            &ctx.work_file("expression.mp4"),
        )?;
        ctx.logger().info(&format!(
            "Repeating {:.3}s expression {} time(s)",
            expression.duration_seconds, count
        ));

        let copies = vec![expression.clone(); count as usize];
        let repeated = concatenate(&ctx.job, &copies, &ctx.work_file("repeated.mp4"))?;

        state.repeated = Some(CompositionSegment::finished(
            SegmentKind::RepeatedExpression {
                asset: expression,
                repeat_count: count,
            },
            repeated,
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.repeated.as_ref().and_then(|s| s.rendered.as_ref()) {
            Some(asset) if asset.path.exists() => Ok(()),
            _ => Err(StepError::invalid_output("repeated expression was not rendered")),
        }
    }
}
