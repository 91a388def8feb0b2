//! Pipeline step implementations.
//!
//! Expression jobs run Probe → ContextClip → RepeatedExpression → Slide →
//! Assemble → ShortForm → Gain → Deliver. Episode jobs run Episode →
//! ShortBatches → Deliver.

mod assemble;
mod context_clip;
mod deliver;
mod episode;
mod gain;
mod probe;
mod repeated;
mod short_form;
mod slide;

pub use assemble::AssembleStep;
pub use context_clip::ContextClipStep;
pub use deliver::DeliverStep;
pub use episode::{EpisodeStep, ShortBatchesStep};
pub use gain::GainStep;
pub use probe::ProbeStep;
pub use repeated::RepeatedExpressionStep;
pub use short_form::ShortFormStep;
pub use slide::SlideStep;

use std::path::Path;

use super::errors::{StepError, StepResult};

/// `FileNotFound` unless `path` exists.
fn require_file(path: &Path) -> StepResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(StepError::file_not_found(path.display().to_string()))
    }
}
