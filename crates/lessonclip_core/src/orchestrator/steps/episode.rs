//! Episode steps - the full-episode join and the short-form batches.
//!
//! Both render into the workspace and queue their files for delivery.

use std::path::PathBuf;

use super::require_file;
use crate::batch::schedule;
use crate::compose::concatenate;
use crate::models::MediaAsset;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{BatchOutput, Context, JobState, StepOutcome};
use crate::probe::probe;

fn probe_all(ctx: &Context, paths: &[PathBuf]) -> StepResult<Vec<MediaAsset>> {
    paths
        .iter()
        .map(|p| probe(&ctx.job, p).map_err(StepError::from))
        .collect()
}

/// Joins every structured clip into one episode file.
pub struct EpisodeStep;

impl EpisodeStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EpisodeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for EpisodeStep {
    fn name(&self) -> &str {
        "Episode"
    }

    fn description(&self) -> &str {
        "Concatenate all structured clips"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let job = ctx.episode()?;
        if job.clips.is_empty() && job.shorts.is_empty() {
            return Err(StepError::invalid_input("episode has no clips and no shorts"));
        }
        for path in job.clips.iter().chain(&job.shorts) {
            require_file(path)?;
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let job = ctx.episode()?;
        if job.clips.is_empty() {
            return Ok(StepOutcome::Skipped("no structured clips".to_string()));
        }

        let clips = probe_all(ctx, &job.clips)?;
        let output = ctx.work_file_like("episode", &job.episode_output);
        let episode = concatenate(&ctx.job, &clips, &output)?;
        ctx.logger().success(&format!(
            "Joined episode ({} clips, {:.3}s)",
            clips.len(),
            episode.duration_seconds
        ));

        state.episode = Some(episode.clone());
        state.deliver_later(episode, &job.episode_output);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.episode {
            Some(ref episode) if episode.path.exists() => Ok(()),
            _ => Err(StepError::invalid_output("episode was not written")),
        }
    }
}

/// Packs short-form clips into duration-bounded batches and joins each
/// batch into its own file.
pub struct ShortBatchesStep;

impl ShortBatchesStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShortBatchesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ShortBatchesStep {
    fn name(&self) -> &str {
        "ShortBatches"
    }

    fn description(&self) -> &str {
        "Batch and join short-form clips"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        ctx.episode()?;
        let budget = ctx.settings().shorts.max_batch_seconds;
        if !(budget.is_finite() && budget > 0.0) {
            return Err(StepError::invalid_input(format!(
                "batch budget must be positive, got {}",
                budget
            )));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let job = ctx.episode()?;
        if job.shorts.is_empty() {
            return Ok(StepOutcome::Skipped("no short-form clips".to_string()));
        }

        let budget = ctx.settings().shorts.max_batch_seconds;
        let shorts = probe_all(ctx, &job.shorts)?;
        let plan = schedule(shorts, budget);

        for short in &plan.oversized {
            ctx.logger().warn(&format!(
                "{} ({:.3}s) is longer than the {:.1}s budget; left out",
                short.path.display(),
                short.duration_seconds,
                budget
            ));
            state.oversized_shorts.push(short.path.clone());
        }
        ctx.logger().info(&format!(
            "{} short(s) packed into {} batch(es)",
            job.shorts.len() - plan.oversized.len(),
            plan.batches.len()
        ));

        let total = plan.batches.len();
        for (index, batch) in plan.batches.iter().enumerate() {
            ctx.job.check_cancelled()?;
            let output = job.batch_output(index);
            let rendered = ctx.work_file_like(&format!("batch_{:02}", index + 1), &output);
            let joined = concatenate(&ctx.job, &batch.included, &rendered)?;
            ctx.logger().success(&format!(
                "Batch {}/{}: {} ({} clips, {:.3}s)",
                index + 1,
                total,
                output.display(),
                batch.included.len(),
                joined.duration_seconds
            ));
            state.short_batches.push(BatchOutput {
                path: output.clone(),
                duration_seconds: joined.duration_seconds,
                members: batch.included.iter().map(|a| a.path.clone()).collect(),
            });
            state.deliver_later(joined, output);
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.missing_delivery() {
            Some(d) => Err(StepError::invalid_output(format!(
                "batch for {} missing: {}",
                d.destination.display(),
                d.rendered.path.display()
            ))),
            None => Ok(()),
        }
    }
}
