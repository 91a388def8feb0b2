//! Composition engines: slicing, concatenation, stacking, audio timelines
//! and gain.
//!
//! Each engine renders into a staged file inside the job workspace, probes
//! and checks the result, and only then moves it to the caller's output
//! path. A failed check leaves nothing behind.

mod concat;
mod gain;
mod slice;
mod stack;
mod timeline;

#[cfg(test)]
mod system_tests;

pub use concat::{
    concatenate, ConcatStrategy, DemuxerConcat, FilterConcat, JoinOutcome,
};
pub use gain::apply_gain;
pub use slice::slice;
pub use stack::stack;
pub use timeline::{build_timeline, plan_timeline, RenderedTimeline};

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::context::JobContext;
use crate::error::{ComposeError, ComposeResult};
use crate::models::MediaAsset;
use crate::probe::probe;

/// A rendered, probed file still inside the workspace.
#[derive(Debug)]
pub struct Staged {
    pub asset: MediaAsset,
    file: TempPath,
}

impl Staged {
    /// Probe a freshly rendered file.
    pub(crate) fn probe(ctx: &JobContext, file: TempPath) -> ComposeResult<Self> {
        let asset = probe(ctx, &file)?;
        Ok(Self { asset, file })
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Move to `output`; the returned asset points at the new location.
    pub fn promote(self, ctx: &JobContext, output: &Path) -> ComposeResult<MediaAsset> {
        let Staged { mut asset, file } = self;
        ctx.workspace()
            .promote(file, output)
            .map_err(|e| ComposeError::io(format!("writing {}", output.display()), e))?;
        asset.path = PathBuf::from(output);
        Ok(asset)
    }
}

/// Reserve a staged output in the workspace matching `output`'s container.
pub(crate) fn staged_output(
    ctx: &JobContext,
    label: &str,
    output: &Path,
) -> ComposeResult<TempPath> {
    ctx.workspace()
        .temp_output_like(label, output)
        .map_err(|e| ComposeError::io("creating staged output", e))
}

/// Escape a path for an ffmpeg concat list entry (`file '...'`).
pub(crate) fn concat_list_entry(path: &Path) -> String {
    format!("file '{}'", path.to_string_lossy().replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_list_escapes_quotes() {
        assert_eq!(
            concat_list_entry(Path::new("/clips/it's.mp4")),
            "file '/clips/it'\\''s.mp4'"
        );
    }
}
