//! Subtitle entry type.
//!
//! Times are `f64` seconds. Rounding to milliseconds happens only when an
//! entry is written back to SRT.

use serde::{Deserialize, Serialize};

/// One timed subtitle cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Index as it appeared in the source file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub start_seconds: f64,
    pub end_seconds: f64,
    /// Cue text, lines joined with `\n`, otherwise untouched.
    pub text: String,
}

impl SubtitleEntry {
    /// Create an entry without an original index.
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            index: None,
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}
