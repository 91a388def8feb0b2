//! Gain step - final volume adjustment.
//!
//! The last media operation of an expression job. Applies to the assembled
//! clip and, when one was stacked, to the short; both results are queued
//! for delivery.

use crate::compose::apply_gain;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct GainStep;

impl GainStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GainStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for GainStep {
    fn name(&self) -> &str {
        "Gain"
    }

    fn description(&self) -> &str {
        "Apply final gain to the clip and the short"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let gain = ctx.expression()?.gain;
        if !(gain.is_finite() && gain >= 0.0) {
            return Err(StepError::invalid_input(format!(
                "gain must be finite and non-negative, got {}",
                gain
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let job = ctx.expression()?;
        let assembled = state.require_assembled()?;

        let output = apply_gain(
            &ctx.job,
            assembled,
            job.gain,
            &ctx.work_file_like("final", &job.output),
        )?;
        ctx.logger().success(&format!(
            "Final clip ready ({:.3}s, gain {})",
            output.duration_seconds, job.gain
        ));
        state.final_output = Some(output.clone());
        state.deliver_later(output, &job.output);

        if let (Some(stacked), Some(short)) = (state.short.clone(), job.short_form.as_ref()) {
            ctx.job.check_cancelled()?;
            let output = apply_gain(
                &ctx.job,
                &stacked,
                job.gain,
                &ctx.work_file_like("short_final", &short.output),
            )?;
            ctx.logger().success(&format!(
                "Final short ready ({:.3}s)",
                output.duration_seconds
            ));
            state.final_short = Some(output.clone());
            state.deliver_later(output, &short.output);
        }
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let output = state.require_final()?;
        if !output.path.exists() {
            return Err(StepError::invalid_output(format!(
                "output missing: {}",
                output.path.display()
            )));
        }
        if !output.has_nonempty_audio() {
            return Err(StepError::invalid_output("output has no audio"));
        }
        if state.short.is_some() && state.final_short.is_none() {
            return Err(StepError::invalid_output("gain was not applied to the short"));
        }
        match state.missing_delivery() {
            Some(d) => Err(StepError::invalid_output(format!(
                "output missing: {}",
                d.rendered.path.display()
            ))),
            None => Ok(()),
        }
    }
}
