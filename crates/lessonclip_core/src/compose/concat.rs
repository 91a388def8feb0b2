//! Concatenation: concat demuxer with stream copy first, normalizing
//! concat filter second.
//!
//! Whatever path is taken, the output carries audio exactly when at least
//! one input had a non-empty audio stream.

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::{concat_list_entry, staged_output, Staged};
use crate::config::EncodingSettings;
use crate::context::JobContext;
use crate::encode::EncodeSpec;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{channel_layout_name, MediaAsset, StreamKind};
use crate::tools::{FfmpegArgs, ToolError, ToolInvocation};

/// Result of one join attempt.
#[derive(Debug)]
pub enum JoinOutcome {
    Succeeded(Staged),
    Failed(String),
}

/// One way of joining inputs end to end.
///
/// `Err` is reserved for conditions that must stop the whole operation
/// (cancellation, I/O in the workspace); a join that merely did not work
/// returns [`JoinOutcome::Failed`].
pub trait ConcatStrategy {
    fn name(&self) -> &'static str;

    fn join(&self, ctx: &JobContext, inputs: &[MediaAsset], output: &Path)
        -> ComposeResult<JoinOutcome>;
}

/// Concatenate `inputs` in order into `output`.
pub fn concatenate(
    ctx: &JobContext,
    inputs: &[MediaAsset],
    output: &Path,
) -> ComposeResult<MediaAsset> {
    if inputs.is_empty() {
        return Err(ComposeError::invalid_input("nothing to concatenate"));
    }
    let with_video = inputs.iter().filter(|a| a.has_video()).count();
    if with_video > 0 && with_video < inputs.len() {
        return Err(ComposeError::concat(
            "some inputs have video and some do not",
            inputs,
        ));
    }

    ctx.logger().section(&format!(
        "Concatenate {} input(s) into {}",
        inputs.len(),
        output.display()
    ));

    let expect_audio = inputs.iter().any(MediaAsset::has_nonempty_audio);
    let strategies: [&dyn ConcatStrategy; 2] = [&DemuxerConcat, &FilterConcat];
    let mut reasons = Vec::new();

    for strategy in strategies {
        ctx.check_cancelled()?;
        ctx.logger().strategy(&format!("Trying {}", strategy.name()));

        match strategy.join(ctx, inputs, output)? {
            JoinOutcome::Succeeded(staged) => {
                if staged.asset.has_nonempty_audio() != expect_audio {
                    let message = if expect_audio {
                        format!("{} output has no audio", strategy.name())
                    } else {
                        format!("{} output has audio no input had", strategy.name())
                    };
                    ctx.logger().error(&message);
                    return Err(ComposeError::concat(
                        message,
                        inputs.iter().chain(std::iter::once(&staged.asset)),
                    ));
                }

                let expected: f64 = inputs.iter().map(|a| a.duration_seconds).sum();
                tracing::debug!(
                    "{} joined {:.3}s (inputs sum to {:.3}s)",
                    strategy.name(),
                    staged.asset.duration_seconds,
                    expected
                );
                ctx.logger().success(&format!(
                    "{} joined {} input(s), {:.3}s",
                    strategy.name(),
                    inputs.len(),
                    staged.asset.duration_seconds
                ));
                return staged.promote(ctx, output);
            }
            JoinOutcome::Failed(reason) => {
                ctx.logger()
                    .strategy(&format!("{} failed: {}", strategy.name(), reason));
                tracing::warn!("{} failed for job {}: {}", strategy.name(), ctx.job_id(), reason);
                reasons.push(format!("{}: {}", strategy.name(), reason));
            }
        }
    }

    Err(ComposeError::concat(reasons.join("; "), inputs))
}

/// Concat demuxer with stream copy. Only valid for uniform inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemuxerConcat;

impl ConcatStrategy for DemuxerConcat {
    fn name(&self) -> &'static str {
        "concat demuxer"
    }

    fn join(
        &self,
        ctx: &JobContext,
        inputs: &[MediaAsset],
        output: &Path,
    ) -> ComposeResult<JoinOutcome> {
        if let Err(reason) = check_uniform(inputs) {
            return Ok(JoinOutcome::Failed(reason));
        }

        let list: Vec<String> = inputs
            .iter()
            .map(|a| concat_list_entry(&absolute(a.path())))
            .collect();
        let list_file = ctx
            .workspace()
            .temp_text("concat", "txt", &(list.join("\n") + "\n"))
            .map_err(|e| ComposeError::io("writing concat list", e))?;

        let Some(first) = inputs.first() else {
            return Ok(JoinOutcome::Failed("no inputs".to_string()));
        };
        let staged = staged_output(ctx, "concat", output)?;
        let mut args = FfmpegArgs::new();
        args.input_with(&["-f", "concat", "-safe", "0"], &list_file);
        if first.has_video() {
            args.map("0:v:0");
            args.extend(EncodeSpec::Copy(StreamKind::Video).to_args());
        }
        if first.has_audio() {
            args.map("0:a:0");
            args.extend(EncodeSpec::Copy(StreamKind::Audio).to_args());
        }
        let invocation = args.output(&staged);

        run_outcome(ctx, &invocation, staged)
    }
}

/// Concat filter over normalized inputs: fixed frame rate, first input's
/// frame size, normalized audio, every clock reset to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterConcat;

impl ConcatStrategy for FilterConcat {
    fn name(&self) -> &'static str {
        "concat filter"
    }

    fn join(
        &self,
        ctx: &JobContext,
        inputs: &[MediaAsset],
        output: &Path,
    ) -> ComposeResult<JoinOutcome> {
        if inputs.is_empty() {
            return Ok(JoinOutcome::Failed("no inputs".to_string()));
        }
        let settings = &ctx.settings().encoding;
        let plan = FilterPlan::build(inputs, settings);
        let resolver = ctx.resolver();

        let staged = staged_output(ctx, "concat", output)?;
        let mut args = FfmpegArgs::new();
        for input in inputs {
            args.input(input.path());
        }
        let silence = format!(
            "anullsrc=r={}:cl={}",
            settings.normalized_sample_rate_hz,
            channel_layout_name(settings.normalized_channels)
        );
        for _ in &plan.silences {
            args.lavfi(&silence);
        }
        args.filter_complex(&plan.graph);
        if plan.video {
            args.map("[outv]");
            args.extend(resolver.normalized_video().to_args());
        }
        if plan.audio {
            args.map("[outa]");
            args.extend(resolver.resolve_audio_params(true).to_args());
        }
        let invocation = args.output(&staged);

        run_outcome(ctx, &invocation, staged)
    }
}

/// Filter graph for [`FilterConcat`].
#[derive(Debug, Clone, PartialEq)]
struct FilterPlan {
    graph: String,
    /// Durations of generated silences, one lavfi input each, added after
    /// the file inputs.
    silences: Vec<f64>,
    video: bool,
    audio: bool,
}

impl FilterPlan {
    fn build(inputs: &[MediaAsset], settings: &EncodingSettings) -> Self {
        let video = inputs.iter().any(MediaAsset::has_video);
        let audio = inputs.iter().any(MediaAsset::has_nonempty_audio);
        let (width, height) = inputs
            .iter()
            .find_map(|a| a.video.as_ref())
            .map(|v| (even(v.width), even(v.height)))
            .unwrap_or((0, 0));

        let rate = settings.normalized_sample_rate_hz;
        let layout = channel_layout_name(settings.normalized_channels);
        let mut chains = Vec::new();
        let mut pads = String::new();
        let mut silences = Vec::new();

        for (i, input) in inputs.iter().enumerate() {
            if video {
                chains.push(format!(
                    "[{i}:v:0]scale={width}:{height}:force_original_aspect_ratio=decrease,\
                     pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},\
                     format={pix},setpts=PTS-STARTPTS[v{i}]",
                    fps = settings.normalized_fps,
                    pix = settings.pixel_format,
                ));
                pads.push_str(&format!("[v{i}]"));
            }
            if audio {
                let source = if input.has_nonempty_audio() {
                    format!("[{i}:a:0]")
                } else {
                    let index = inputs.len() + silences.len();
                    silences.push(input.duration_seconds);
                    format!("[{index}:a:0]atrim=duration={:.3},", input.duration_seconds)
                };
                chains.push(format!(
                    "{source}aresample={rate},aformat=sample_fmts=fltp:channel_layouts={layout},\
                     asetpts=PTS-STARTPTS[a{i}]"
                ));
                pads.push_str(&format!("[a{i}]"));
            }
        }

        let mut outs = String::new();
        if video {
            outs.push_str("[outv]");
        }
        if audio {
            outs.push_str("[outa]");
        }
        chains.push(format!(
            "{pads}concat=n={}:v={}:a={}{outs}",
            inputs.len(),
            video as u8,
            audio as u8
        ));

        Self {
            graph: chains.join(";"),
            silences,
            video,
            audio,
        }
    }
}

/// `Ok` when the demuxer can stream-copy: same video codec, size and rate,
/// same audio codec, channels and rate, and audio on all inputs or none.
fn check_uniform(inputs: &[MediaAsset]) -> Result<(), String> {
    let Some((first, rest)) = inputs.split_first() else {
        return Err("no inputs".to_string());
    };
    for other in rest {
        let video_ok = match (&first.video, &other.video) {
            (Some(a), Some(b)) => a.is_join_compatible(b),
            (None, None) => true,
            _ => false,
        };
        if !video_ok {
            return Err(format!(
                "video parameters of {} differ from {}",
                other.path.display(),
                first.path.display()
            ));
        }

        let audio_ok = match (first.has_nonempty_audio(), other.has_nonempty_audio()) {
            (true, true) => match (&first.audio, &other.audio) {
                (Some(a), Some(b)) => a.is_join_compatible(b),
                _ => false,
            },
            (false, false) => true,
            _ => false,
        };
        if !audio_ok {
            return Err(format!(
                "audio parameters of {} differ from {}",
                other.path.display(),
                first.path.display()
            ));
        }
    }
    Ok(())
}

/// Run a join and probe its output; tool and probe failures become
/// [`JoinOutcome::Failed`], cancellation stays an error.
fn run_outcome(
    ctx: &JobContext,
    invocation: &ToolInvocation,
    staged: TempPath,
) -> ComposeResult<JoinOutcome> {
    match ctx.run(invocation) {
        Ok(_) => {}
        Err(ToolError::Cancelled { .. }) => return Err(ctx.cancelled()),
        Err(e) => return Ok(JoinOutcome::Failed(e.to_string())),
    }
    match Staged::probe(ctx, staged) {
        Ok(staged) => Ok(JoinOutcome::Succeeded(staged)),
        Err(e) if e.is_cancelled() => Err(e),
        Err(e) => Ok(JoinOutcome::Failed(e.to_string())),
    }
}

/// libx264 with yuv420p needs even dimensions.
fn even(value: u32) -> u32 {
    value - value % 2
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
