//! Cut a time window out of a source file.

use std::path::Path;

use super::{staged_output, Staged};
use crate::context::JobContext;
use crate::encode::FilterUse;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{MediaAsset, TimeRange};
use crate::tools::{seconds_arg, FfmpegArgs};

/// Windows may overshoot the probed duration by this much (container
/// durations are rounded).
const END_TOLERANCE_SECONDS: f64 = 0.05;

/// Cut `range` out of `source` into `output`.
///
/// The cut is frame-accurate, so both streams are re-encoded; the output
/// keeps exactly the streams the source has.
pub fn slice(
    ctx: &JobContext,
    source: &MediaAsset,
    range: TimeRange,
    output: &Path,
) -> ComposeResult<MediaAsset> {
    if !range.is_valid() {
        return Err(ComposeError::invalid_input(format!(
            "invalid window {:.3}-{:.3}s",
            range.start_seconds, range.end_seconds
        )));
    }
    if range.end_seconds > source.duration_seconds + END_TOLERANCE_SECONDS {
        return Err(ComposeError::invalid_input(format!(
            "window ends at {:.3}s but {} is {:.3}s long",
            range.end_seconds,
            source.path.display(),
            source.duration_seconds
        )));
    }

    ctx.logger().section(&format!(
        "Slice {:.3}s-{:.3}s of {}",
        range.start_seconds,
        range.end_seconds,
        source.path.display()
    ));

    let resolver = ctx.resolver();
    let staged = staged_output(ctx, "slice", output)?;

    let mut args = FfmpegArgs::new();
    let start = seconds_arg(range.start_seconds);
    args.input_with(&["-ss", start.as_str()], source.path());
    args.opt("-t", seconds_arg(range.duration_seconds()));
    if source.has_video() {
        args.map("0:v:0");
        args.extend(resolver.resolve_video_params(source, FilterUse::both()).to_args());
    }
    if source.has_audio() {
        args.map("0:a:0");
        args.extend(resolver.resolve_audio_for(source, FilterUse::both()).to_args());
    }
    let invocation = args.output(&staged);

    ctx.run(&invocation)
        .map_err(|e| ctx.tool_failure(e, |m| ComposeError::encode(m, [source])))?;

    let staged = Staged::probe(ctx, staged)?;
    if source.has_video() != staged.asset.has_video()
        || source.has_nonempty_audio() != staged.asset.has_nonempty_audio()
    {
        return Err(ComposeError::encode(
            "slice changed the set of streams",
            [source, &staged.asset],
        ));
    }

    staged.promote(ctx, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::models::media::fixtures;
    use crate::tools::scripted::{arg_after, Reply, ScriptedRunner};
    use std::sync::Arc;

    #[test]
    fn slices_with_seek_and_duration() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());
        let source = fixtures::clip("/src/episode.mp4", 600.0);
        runner.push(Reply::Produce(fixtures::clip("", 5.0)));

        let output = dir.path().join("context.mp4");
        let clip = slice(&ctx, &source, TimeRange::new(120.5, 125.5), &output).unwrap();

        assert_eq!(clip.path, output);
        assert!(output.exists());
        let call = &runner.ffmpeg_calls()[0];
        assert_eq!(arg_after(call, "-ss"), Some("120.500"));
        assert_eq!(arg_after(call, "-t"), Some("5.000"));
        assert_eq!(arg_after(call, "-c:v"), Some("libx264"));
    }

    #[test]
    fn rejects_window_past_end() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());
        let source = fixtures::clip("/src/episode.mp4", 10.0);

        let result = slice(&ctx, &source, TimeRange::new(8.0, 12.0), &dir.path().join("x.mp4"));
        assert!(matches!(result, Err(ComposeError::InvalidInput(_))));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn dropped_audio_is_an_error() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());
        let source = fixtures::clip("/src/episode.mp4", 60.0);
        let mut silent = fixtures::clip("", 5.0);
        silent.audio = None;
        runner.push(Reply::Produce(silent));

        let output = dir.path().join("context.mp4");
        let result = slice(&ctx, &source, TimeRange::new(0.0, 5.0), &output);
        assert!(matches!(result, Err(ComposeError::Encode { .. })));
        assert!(!output.exists());
    }
}
