//! Silence-padded, repeated speech audio.
//!
//! One ffmpeg run: the speech is split N ways, silences are generated at
//! the speech's own rate and layout, and everything is joined with the
//! concat filter. The timeline's total comes from the plan, not from the
//! rendered file.

use std::path::Path;

use super::{staged_output, Staged};
use crate::context::JobContext;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{AudioTimeline, MediaAsset, TimelinePadding, TimelinePieceKind};
use crate::tools::FfmpegArgs;

/// A rendered timeline and its description.
#[derive(Debug, Clone)]
pub struct RenderedTimeline {
    pub timeline: AudioTimeline,
    pub asset: MediaAsset,
}

impl RenderedTimeline {
    /// Analytic total (sum of the pieces).
    pub fn total_duration_seconds(&self) -> f64 {
        self.timeline.total_duration_seconds()
    }
}

/// Lay out the timeline without rendering it.
pub fn plan_timeline(
    speech_seconds: f64,
    repeat_count: u32,
    padding: TimelinePadding,
) -> ComposeResult<AudioTimeline> {
    if repeat_count == 0 {
        return Err(ComposeError::timeline(
            "repeat count must be at least 1",
            std::iter::empty(),
        ));
    }
    if !padding.is_valid() {
        return Err(ComposeError::timeline(
            format!(
                "silences must be finite and non-negative (start {}, gap {}, end {})",
                padding.start_seconds, padding.gap_seconds, padding.end_seconds
            ),
            std::iter::empty(),
        ));
    }
    if !(speech_seconds.is_finite() && speech_seconds > 0.0) {
        return Err(ComposeError::timeline(
            format!("speech duration must be positive, got {}", speech_seconds),
            std::iter::empty(),
        ));
    }
    Ok(AudioTimeline::repeated(speech_seconds, repeat_count, padding))
}

/// Render `speech` repeated `repeat_count` times with `padding` into `output`.
pub fn build_timeline(
    ctx: &JobContext,
    speech: &MediaAsset,
    repeat_count: u32,
    padding: TimelinePadding,
    output: &Path,
) -> ComposeResult<RenderedTimeline> {
    let audio = match &speech.audio {
        Some(a) if speech.has_nonempty_audio() && a.sample_rate_hz > 0 && a.channel_count > 0 => a,
        _ => {
            return Err(ComposeError::timeline(
                "speech needs a non-empty audio stream with known rate and channels",
                [speech],
            ))
        }
    };
    let speech_seconds = audio.duration_seconds.unwrap_or(speech.duration_seconds);
    let timeline = plan_timeline(speech_seconds, repeat_count, padding).map_err(|e| match e {
        ComposeError::Timeline { message, .. } => ComposeError::timeline(message, [speech]),
        other => other,
    })?;

    let graph = timeline_graph(&timeline, audio.sample_rate_hz, &audio.channel_layout());
    ctx.logger().section(&format!(
        "Timeline: {} x {:.3}s speech, {:.3}s total",
        repeat_count,
        speech_seconds,
        timeline.total_duration_seconds()
    ));

    let staged = staged_output(ctx, "timeline", output)?;
    let mut args = FfmpegArgs::new();
    args.input(speech.path());
    args.filter_complex(&graph);
    args.map("[out]");
    args.extend(ctx.resolver().resolve_audio_params(false).to_args());
    let invocation = args.output(&staged);

    ctx.run(&invocation)
        .map_err(|e| ctx.tool_failure(e, |m| ComposeError::timeline(m, [speech])))?;

    let staged = Staged::probe(ctx, staged)?;
    if !staged.asset.has_nonempty_audio() {
        return Err(ComposeError::timeline(
            "rendered timeline has no audio",
            [speech, &staged.asset],
        ));
    }
    tracing::debug!(
        "Timeline rendered at {:.3}s (planned {:.3}s)",
        staged.asset.duration_seconds,
        timeline.total_duration_seconds()
    );

    Ok(RenderedTimeline {
        timeline,
        asset: staged.promote(ctx, output)?,
    })
}

/// Filter graph for a timeline over input 0. Zero-length silences are
/// skipped.
fn timeline_graph(timeline: &AudioTimeline, sample_rate_hz: u32, layout: &str) -> String {
    let speech_count = timeline.count(TimelinePieceKind::Speech);
    let mut chains = Vec::new();

    let mut split = format!("[0:a:0]asplit={}", speech_count);
    for k in 0..speech_count {
        split.push_str(&format!("[s{}]", k));
    }
    chains.push(split);

    let mut pads = String::new();
    let mut next_speech = 0;
    let mut rendered = 0;
    for piece in timeline.pieces() {
        match piece.kind {
            TimelinePieceKind::Speech => {
                chains.push(format!("[s{}]asetpts=PTS-STARTPTS[p{}]", next_speech, rendered));
                next_speech += 1;
            }
            TimelinePieceKind::Silence if piece.duration_seconds > 0.0 => {
                chains.push(format!(
                    "anullsrc=r={}:cl={},atrim=duration={:.3}[p{}]",
                    sample_rate_hz, layout, piece.duration_seconds, rendered
                ));
            }
            TimelinePieceKind::Silence => continue,
        }
        pads.push_str(&format!("[p{}]", rendered));
        rendered += 1;
    }

    chains.push(format!("{}concat=n={}:v=0:a=1[out]", pads, rendered));
    chains.join(";")
}
