//! Seams for work done by external collaborators.
//!
//! Styled subtitle rendering and slide design live outside this crate. The
//! defaults here are plain ffmpeg renditions: unstyled burn-in and a still
//! background looped under the timeline audio.

use std::path::Path;

use crate::compose::{staged_output, Staged};
use crate::context::JobContext;
use crate::encode::{EncodeSpec, FilterUse};
use crate::error::{ComposeError, ComposeResult};
use crate::models::MediaAsset;
use crate::tools::{seconds_arg, FfmpegArgs};

/// Burns an SRT file into a clip's video.
pub trait SubtitleBurner: Send + Sync {
    fn burn(
        &self,
        ctx: &JobContext,
        clip: &MediaAsset,
        subtitles: &Path,
        output: &Path,
    ) -> ComposeResult<MediaAsset>;
}

/// Renders a slide video: a background under a finished audio timeline.
pub trait SlideComposer: Send + Sync {
    /// `reference` is the clip the slide will be joined with; the slide
    /// matches its frame size, frame rate and audio format.
    fn compose(
        &self,
        ctx: &JobContext,
        background: &Path,
        audio: &MediaAsset,
        reference: &MediaAsset,
        output: &Path,
    ) -> ComposeResult<MediaAsset>;
}

/// `subtitles` filter with default styling. Audio is stream-copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegSubtitleBurner;

impl SubtitleBurner for FfmpegSubtitleBurner {
    fn burn(
        &self,
        ctx: &JobContext,
        clip: &MediaAsset,
        subtitles: &Path,
        output: &Path,
    ) -> ComposeResult<MediaAsset> {
        if !clip.has_video() {
            return Err(ComposeError::encode("cannot burn subtitles without video", [clip]));
        }
        ctx.logger()
            .section(&format!("Burn subtitles into {}", clip.path.display()));

        let resolver = ctx.resolver();
        let staged = staged_output(ctx, "burn", output)?;
        let mut args = FfmpegArgs::new();
        args.input(clip.path());
        args.filter_complex(&format!(
            "[0:v:0]subtitles=filename='{}':charenc=UTF-8[v]",
            escape_filter_path(subtitles)
        ));
        args.map("[v]");
        args.extend(resolver.resolve_video_params(clip, FilterUse::video()).to_args());
        if clip.has_audio() {
            args.map("0:a:0");
            args.extend(resolver.resolve_audio_for(clip, FilterUse::video()).to_args());
        }
        let invocation = args.output(&staged);

        ctx.run(&invocation)
            .map_err(|e| ctx.tool_failure(e, |m| ComposeError::encode(m, [clip])))?;

        let staged = Staged::probe(ctx, staged)?;
        if !staged.asset.has_video() || staged.asset.has_audio() != clip.has_audio() {
            return Err(ComposeError::encode(
                "burned clip lost a stream",
                [clip, &staged.asset],
            ));
        }
        staged.promote(ctx, output)
    }
}

/// Loops a still image for the length of the audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct StillImageSlideComposer;

impl SlideComposer for StillImageSlideComposer {
    fn compose(
        &self,
        ctx: &JobContext,
        background: &Path,
        audio: &MediaAsset,
        reference: &MediaAsset,
        output: &Path,
    ) -> ComposeResult<MediaAsset> {
        let Some(frame) = reference.video.as_ref() else {
            return Err(ComposeError::encode(
                "slide reference has no video",
                [audio, reference],
            ));
        };
        if !audio.has_nonempty_audio() {
            return Err(ComposeError::encode("slide audio is empty", [audio, reference]));
        }
        if !background.exists() {
            return Err(ComposeError::invalid_input(format!(
                "slide background not found: {}",
                background.display()
            )));
        }

        ctx.logger().section(&format!(
            "Slide {} under {:.3}s of audio",
            background.display(),
            audio.duration_seconds
        ));

        let resolver = ctx.resolver();
        let staged = staged_output(ctx, "slide", output)?;
        let mut args = FfmpegArgs::new();
        let rate = frame
            .frame_rate
            .unwrap_or_else(|| ctx.settings().encoding.normalized_frame_rate())
            .to_string();
        args.input_with(&["-loop", "1", "-framerate", rate.as_str()], background);
        args.input(audio.path());
        args.filter_complex(&format!(
            "[0:v:0]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,format={pix}[v]",
            w = frame.width,
            h = frame.height,
            pix = ctx.settings().encoding.pixel_format
        ));
        args.map("[v]");
        args.extend(resolver.resolve_video_params(reference, FilterUse::video()).to_args());
        args.map("1:a:0");
        args.extend(matching_audio(resolver.resolve_audio_params(false), reference).to_args());
        args.opt("-t", seconds_arg(audio.duration_seconds));
        let invocation = args.output(&staged);

        ctx.run(&invocation)
            .map_err(|e| ctx.tool_failure(e, |m| ComposeError::encode(m, [audio, reference])))?;

        let staged = Staged::probe(ctx, staged)?;
        if !staged.asset.has_video() || !staged.asset.has_nonempty_audio() {
            return Err(ComposeError::encode(
                "slide is missing a stream",
                [audio, reference, &staged.asset],
            ));
        }
        staged.promote(ctx, output)
    }
}

/// Force an audio target to `reference`'s sample rate and channel count.
fn matching_audio(spec: EncodeSpec, reference: &MediaAsset) -> EncodeSpec {
    match (spec, reference.audio.as_ref()) {
        (EncodeSpec::Audio(mut target), Some(audio)) => {
            target.sample_rate_hz = Some(audio.sample_rate_hz);
            target.channels = Some(audio.channel_count);
            EncodeSpec::Audio(target)
        }
        (spec, _) => spec,
    }
}

/// Escape a path for use as a filter option value.
pub(crate) fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let mut escaped = String::with_capacity(normalized.len() + 8);
    for ch in normalized.chars() {
        match ch {
            ':' | '\'' | ',' | ';' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
