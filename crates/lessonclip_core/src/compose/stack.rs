//! Side-by-side and top/bottom composition.

use std::path::Path;

use super::{staged_output, Staged};
use crate::context::JobContext;
use crate::encode::FilterUse;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{MediaAsset, Orientation};
use crate::tools::FfmpegArgs;

/// Largest allowed gap between the stacked output and the primary.
const DURATION_TOLERANCE_SECONDS: f64 = 0.1;

/// Join `secondary` onto `primary` along `orientation`.
///
/// The secondary is scaled, aspect kept, to the primary's height
/// (horizontal) or width (vertical). Audio comes from the primary only and
/// is stream-copied; video is filtered and therefore re-encoded. The
/// output lasts as long as the primary: a shorter secondary holds its last
/// frame, a longer one is cut.
pub fn stack(
    ctx: &JobContext,
    primary: &MediaAsset,
    secondary: &MediaAsset,
    orientation: Orientation,
    output: &Path,
) -> ComposeResult<MediaAsset> {
    let graph = stack_graph(
        primary,
        secondary,
        orientation,
        &ctx.settings().encoding.pixel_format,
    )?;

    ctx.logger().section(&format!(
        "Stack {} ({})",
        secondary.path.display(),
        orientation
    ));

    let resolver = ctx.resolver();
    let staged = staged_output(ctx, "stack", output)?;
    let mut args = FfmpegArgs::new();
    args.input(primary.path());
    args.input(secondary.path());
    args.filter_complex(&graph);
    args.map("[v]");
    args.extend(resolver.resolve_video_params(primary, FilterUse::video()).to_args());
    if primary.has_audio() {
        args.map("0:a:0");
        args.extend(resolver.resolve_audio_for(primary, FilterUse::video()).to_args());
    }
    let invocation = args.output(&staged);

    ctx.run(&invocation).map_err(|e| {
        ctx.tool_failure(e, |m| ComposeError::stack(m, [primary, secondary]))
    })?;

    let staged = Staged::probe(ctx, staged)?;
    if !staged.asset.has_video() || staged.asset.has_audio() != primary.has_audio() {
        return Err(ComposeError::stack(
            "stacked output does not have the primary's streams",
            [primary, secondary, &staged.asset],
        ));
    }
    if (staged.asset.duration_seconds - primary.duration_seconds).abs() > DURATION_TOLERANCE_SECONDS
    {
        return Err(ComposeError::stack(
            format!(
                "stacked output is {:.3}s, primary is {:.3}s",
                staged.asset.duration_seconds, primary.duration_seconds
            ),
            [primary, secondary, &staged.asset],
        ));
    }
    staged.promote(ctx, output)
}

fn stack_graph(
    primary: &MediaAsset,
    secondary: &MediaAsset,
    orientation: Orientation,
    pixel_format: &str,
) -> ComposeResult<String> {
    let (Some(p), Some(_)) = (&primary.video, &secondary.video) else {
        return Err(ComposeError::stack(
            "both inputs need a video stream",
            [primary, secondary],
        ));
    };

    // -2 keeps the aspect ratio and rounds to an even size
    let scale = match orientation {
        Orientation::Horizontal if p.height > 0 => format!("scale=-2:{}", p.height),
        Orientation::Vertical if p.width > 0 => format!("scale={}:-2", p.width),
        _ => {
            return Err(ComposeError::stack(
                format!("primary has a zero {} dimension", orientation),
                [primary, secondary],
            ))
        }
    };

    Ok(format!(
        "[0:v:0]setsar=1,format={pix}[p];\
         [1:v:0]{scale},setsar=1,format={pix},tpad=stop=-1:stop_mode=clone[s];\
         [p][s]{filter}=inputs=2:shortest=1[v]",
        pix = pixel_format,
        filter = orientation.filter_name(),
    ))
}
