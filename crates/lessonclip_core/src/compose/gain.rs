//! Final volume adjustment.

use std::path::Path;

use super::{staged_output, Staged};
use crate::context::JobContext;
use crate::encode::FilterUse;
use crate::error::{ComposeError, ComposeResult};
use crate::models::MediaAsset;
use crate::tools::FfmpegArgs;

/// Scale the audio of `asset` by `factor` into `output`.
///
/// Video is always stream-copied. Audio is always re-encoded (normalized),
/// even for a factor of 1.0.
pub fn apply_gain(
    ctx: &JobContext,
    asset: &MediaAsset,
    factor: f64,
    output: &Path,
) -> ComposeResult<MediaAsset> {
    if !(factor.is_finite() && factor >= 0.0) {
        return Err(ComposeError::invalid_input(format!(
            "gain factor must be finite and non-negative, got {}",
            factor
        )));
    }
    if !asset.has_audio() {
        return Err(ComposeError::encode("cannot apply gain without audio", [asset]));
    }

    ctx.logger().section(&format!("Gain x{} on {}", factor, asset.path.display()));

    let resolver = ctx.resolver();
    let staged = staged_output(ctx, "gain", output)?;
    let mut args = FfmpegArgs::new();
    args.input(asset.path());
    if asset.has_video() {
        args.map("0:v:0");
        args.extend(resolver.resolve_video_params(asset, FilterUse::audio()).to_args());
    }
    args.map("0:a:0");
    args.opt("-af", format!("volume={}", factor));
    args.extend(resolver.resolve_audio_params(true).to_args());
    let invocation = args.output(&staged);

    ctx.run(&invocation)
        .map_err(|e| ctx.tool_failure(e, |m| ComposeError::encode(m, [asset])))?;

    let staged = Staged::probe(ctx, staged)?;
    if !staged.asset.has_audio() || staged.asset.has_video() != asset.has_video() {
        return Err(ComposeError::encode(
            "gain output lost a stream",
            [asset, &staged.asset],
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
    fn unity_gain_copies_video() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());
        runner.push(Reply::Produce(fixtures::clip("", 12.0)));

        let asset = fixtures::clip("/assembled.mp4", 12.0);
        let output = dir.path().join("final.mp4");
        apply_gain(&ctx, &asset, 1.0, &output).unwrap();

        let call = &runner.ffmpeg_calls()[0];
        assert_eq!(arg_after(call, "-c:v"), Some("copy"));
        assert_eq!(arg_after(call, "-af"), Some("volume=1"));
        assert_eq!(arg_after(call, "-c:a"), Some("aac"));
        assert_eq!(arg_after(call, "-b:a"), Some("256k"));
        assert!(output.exists());
    }

    #[test]
    fn fractional_factor_is_passed_through() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());
        runner.push(Reply::Produce(fixtures::clip("", 12.0)));

        let asset = fixtures::clip("/assembled.mp4", 12.0);
        apply_gain(&ctx, &asset, 1.25, &dir.path().join("final.mp4")).unwrap();
        assert_eq!(
            arg_after(&runner.ffmpeg_calls()[0], "-af"),
            Some("volume=1.25")
        );
    }

    #[test]
    fn rejects_missing_audio_and_bad_factor() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());
        let output = dir.path().join("final.mp4");

        let mut mute = fixtures::clip("/mute.mp4", 3.0);
        mute.audio = None;
        assert!(matches!(
            apply_gain(&ctx, &mute, 1.0, &output),
            Err(ComposeError::Encode { .. })
        ));

        let asset = fixtures::clip("/a.mp4", 3.0);
        assert!(apply_gain(&ctx, &asset, f64::NAN, &output).is_err());
        assert!(apply_gain(&ctx, &asset, -0.5, &output).is_err());
        assert!(runner.calls().is_empty());
    }
}
