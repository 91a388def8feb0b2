//! Slide step - still background under the repeated speech timeline.
//!
//! Optional: skipped when the job has no slide.

use super::require_file;
use crate::compose::build_timeline;
use crate::models::{CompositionSegment, SegmentKind};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::probe::probe;

pub struct SlideStep;

impl SlideStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SlideStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SlideStep {
    fn name(&self) -> &str {
        "Slide"
    }

    fn description(&self) -> &str {
        "Render the educational slide"
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let Some(ref slide) = ctx.expression()?.slide else {
            return Ok(());
        };
        require_file(&slide.background)?;
        require_file(&slide.speech_audio)?;
        if slide.repeat_count == Some(0) {
            return Err(StepError::invalid_input("slide repeat count must be at least 1"));
        }
        if let Some(padding) = slide.padding {
            if !padding.is_valid() {
                return Err(StepError::invalid_input(
                    "slide silences must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let Some(ref slide) = ctx.expression()?.slide else {
            return Ok(StepOutcome::Skipped("no slide requested".to_string()));
        };
        let defaults = &ctx.settings().timeline;
        let repeat_count = slide.repeat_count.unwrap_or(defaults.repeat_count);
        let padding = slide.padding.unwrap_or_else(|| defaults.padding());

        let speech = probe(&ctx.job, &slide.speech_audio)?;
        let timeline = build_timeline(
            &ctx.job,
            &speech,
            repeat_count,
            padding,
            &ctx.work_file("slide_audio.m4a"),
        )?;

        // Match the first rendered segment so the join can stream-copy
        let reference = state
            .segments()
            .first()
            .and_then(|s| s.rendered.clone())
            .map_or_else(|| state.require_source().cloned(), Ok)?;

        let video = ctx.slide_composer().compose(
            &ctx.job,
            &slide.background,
            &timeline.asset,
            &reference,
            &ctx.work_file("slide.mp4"),
        )?;
        ctx.logger().info(&format!(
            "Slide rendered: {:.3}s (timeline {:.3}s)",
            video.duration_seconds,
            timeline.total_duration_seconds()
        ));

        state.slide = Some(CompositionSegment::finished(
            SegmentKind::EducationalSlide {
                background: slide.background.clone(),
                audio_timeline: timeline.timeline,
            },
            video,
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match state.slide.as_ref().and_then(|s| s.rendered.as_ref()) {
            Some(asset) if asset.has_nonempty_audio() => Ok(()),
            Some(_) => Err(StepError::invalid_output("slide has no audio")),
            None => Err(StepError::invalid_output("slide was not rendered")),
        }
    }
}
