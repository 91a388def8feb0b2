//! Engine error type.
//!
//! Every composition failure is fatal and carries a dump of the media
//! parameters involved so a log reader can see *why* two inputs did not
//! join without re-probing them by hand.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::MediaAsset;
use crate::subtitles::SubtitleError;

/// Parameter summaries of the assets involved in a failed operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<String>);

impl Diagnostics {
    pub fn of<'a>(assets: impl IntoIterator<Item = &'a MediaAsset>) -> Self {
        Self(assets.into_iter().map(MediaAsset::summary).collect())
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.0 {
            write!(f, "\n  - {}", line)?;
        }
        Ok(())
    }
}

/// Errors from the assembly engine.
#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Probe failed for '{path}': {message}")]
    Probe { path: PathBuf, message: String },

    #[error("Concatenation failed: {message}{diagnostics}")]
    Concat {
        message: String,
        diagnostics: Diagnostics,
    },

    #[error("Stacking failed: {message}{diagnostics}")]
    Stack {
        message: String,
        diagnostics: Diagnostics,
    },

    #[error("Audio timeline failed: {message}{diagnostics}")]
    Timeline {
        message: String,
        diagnostics: Diagnostics,
    },

    #[error("Encode failed: {message}{diagnostics}")]
    Encode {
        message: String,
        diagnostics: Diagnostics,
    },

    #[error("Job '{job_id}' was cancelled")]
    Cancelled { job_id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Subtitle(#[from] SubtitleError),
}

/// Result type for engine operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

impl ComposeError {
    pub fn probe(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn concat<'a>(
        message: impl fmt::Display,
        assets: impl IntoIterator<Item = &'a MediaAsset>,
    ) -> Self {
        Self::Concat {
            message: message.to_string(),
            diagnostics: Diagnostics::of(assets),
        }
    }

    pub fn stack<'a>(
        message: impl fmt::Display,
        assets: impl IntoIterator<Item = &'a MediaAsset>,
    ) -> Self {
        Self::Stack {
            message: message.to_string(),
            diagnostics: Diagnostics::of(assets),
        }
    }

    pub fn timeline<'a>(
        message: impl fmt::Display,
        assets: impl IntoIterator<Item = &'a MediaAsset>,
    ) -> Self {
        Self::Timeline {
            message: message.to_string(),
            diagnostics: Diagnostics::of(assets),
        }
    }

    pub fn encode<'a>(
        message: impl fmt::Display,
        assets: impl IntoIterator<Item = &'a MediaAsset>,
    ) -> Self {
        Self::Encode {
            message: message.to_string(),
            diagnostics: Diagnostics::of(assets),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Parameter dump, if this kind carries one.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Concat { diagnostics, .. }
            | Self::Stack { diagnostics, .. }
            | Self::Timeline { diagnostics, .. }
            | Self::Encode { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
