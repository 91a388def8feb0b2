//! Deliver step - moves finished workspace files to the caller's paths.
//!
//! Runs last, so a job that fails anywhere earlier leaves nothing at the
//! caller's paths. If one move fails, files already moved are removed again.

use std::fs;

use crate::error::ComposeError;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct DeliverStep;

impl DeliverStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeliverStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DeliverStep {
    fn name(&self) -> &str {
        "Deliver"
    }

    fn description(&self) -> &str {
        "Move finished files to their output paths"
    }

    fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if state.deliveries.is_empty() {
            return Ok(StepOutcome::Skipped("nothing to deliver".to_string()));
        }
        if let Some(missing) = state.missing_delivery() {
            return Err(StepError::precondition_failed(format!(
                "rendered file for {} is gone: {}",
                missing.destination.display(),
                missing.rendered.path.display()
            )));
        }

        let workspace = ctx.job.workspace();
        let mut delivered: Vec<std::path::PathBuf> = Vec::with_capacity(state.deliveries.len());
        for delivery in &state.deliveries {
            let destination = &delivery.destination;
            if let Err(e) = workspace.deliver(&delivery.rendered.path, destination) {
                for path in &delivered {
                    if let Err(remove) = fs::remove_file(path) {
                        ctx.logger()
                            .warn(&format!("Could not remove {}: {}", path.display(), remove));
                    }
                }
                return Err(ComposeError::io(
                    format!("moving output to {}", destination.display()),
                    e,
                )
                .into());
            }
            ctx.logger().info(&format!("Delivered {}", destination.display()));
            delivered.push(destination.clone());
        }

        state.delivered = delivered;
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.delivered.len() != state.deliveries.len() {
            return Err(StepError::invalid_output(format!(
                "{} of {} outputs delivered",
                state.delivered.len(),
                state.deliveries.len()
            )));
        }
        match state.delivered.iter().find(|p| !p.exists()) {
            Some(path) => Err(StepError::invalid_output(format!(
                "output missing: {}",
                path.display()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::fixtures;
    use crate::orchestrator::test_support::test_pipeline_context;
    use crate::tools::scripted::ScriptedRunner;
    use std::sync::Arc;

    fn rendered(ctx: &Context, name: &str) -> crate::models::MediaAsset {
        let path = ctx.work_file(name);
        fs::write(&path, name.as_bytes()).unwrap();
        fixtures::clip(&path.to_string_lossy(), 5.0)
    }

    #[test]
    fn moves_every_queued_file() {
        let (dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let mut state = JobState::new("deliver-1");
        let out = dir.path().join("out");
        state.deliver_later(rendered(&ctx, "final.mp4"), out.join("expr.mp4"));
        state.deliver_later(rendered(&ctx, "short_final.mp4"), out.join("short.mp4"));

        let step = DeliverStep::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        assert_eq!(state.outputs(), vec![out.join("expr.mp4"), out.join("short.mp4")]);
        assert_eq!(fs::read(out.join("short.mp4")).unwrap(), b"short_final.mp4");
        assert!(!ctx.work_file("final.mp4").exists());
    }

    #[test]
    fn failed_move_removes_files_already_delivered() {
        let (dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let mut state = JobState::new("deliver-2");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let first = dir.path().join("out").join("expr.mp4");
        state.deliver_later(rendered(&ctx, "final.mp4"), &first);
        state.deliver_later(rendered(&ctx, "short_final.mp4"), blocker.join("short.mp4"));

        let err = DeliverStep::new().execute(&ctx, &mut state).unwrap_err();

        assert!(err.to_string().contains("short.mp4"), "{}", err);
        assert!(!first.exists());
        assert!(state.outputs().is_empty());
    }

    #[test]
    fn nothing_queued_is_skipped() {
        let (_dir, ctx) = test_pipeline_context(Arc::new(ScriptedRunner::new()));
        let mut state = JobState::new("deliver-3");
        assert!(matches!(
            DeliverStep::new().execute(&ctx, &mut state).unwrap(),
            StepOutcome::Skipped(_)
        ));
    }
}
