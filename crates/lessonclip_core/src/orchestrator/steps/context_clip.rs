//! ContextClip step - cuts the context window and burns its subtitles.
//!
//! The source's SRT is realigned onto the clip's own time base first; cues
//! outside the window are dropped. With no cue left (or no SRT at all) the
//! raw slice is the segment.

use crate::compose::slice;
use crate::models::{CompositionSegment, SegmentKind};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::subtitles::realign_srt_file;

pub struct ContextClipStep;

impl ContextClipStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContextClipStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ContextClipStep {
    fn name(&self) -> &str {
        "ContextClip"
    }

    fn description(&self) -> &str {
        "Cut the context clip and burn in its subtitles"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        ctx.expression().map(|_| ())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let job = ctx.expression()?;
        let source = state.require_source()?;
        let window = job.context_window;

        let raw = slice(&ctx.job, source, window, &ctx.work_file("context_raw.mp4"))?;

        let (entries, rendered) = match job.subtitles {
            Some(ref srt) => {
                let aligned = ctx.work_file("context.srt");
                let entries = realign_srt_file(
                    srt,
                    &aligned,
                    window.start_seconds,
                    Some(window.end_seconds),
                )?;
                if entries.is_empty() {
                    ctx.logger()
                        .info("No subtitle cues inside the context window");
                    (entries, raw.clone())
                } else {
                    ctx.logger()
                        .info(&format!("{} subtitle cue(s) realigned", entries.len()));
                    let burned = ctx.subtitle_burner().burn(
                        &ctx.job,
                        &raw,
                        &aligned,
                        &ctx.work_file("context.mp4"),
                    )?;
                    (entries, burned)
                }
            }
            None => (Vec::new(), raw.clone()),
        };

        state.context_clip = Some(CompositionSegment::finished(
            SegmentKind::ContextClip {
                asset: raw,
                subtitle_entries: entries,
            },
            rendered,
        ));
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let rendered = state
            .context_clip
            .as_ref()
            .and_then(|s| s.rendered.as_ref())
            .ok_or_else(|| StepError::invalid_output("context clip was not rendered"))?;
        if !rendered.path.exists() {
            return Err(StepError::invalid_output(format!(
                "context clip missing: {}",
                rendered.path.display()
            )));
        }
        Ok(())
    }
}
