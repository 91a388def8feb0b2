//! lessonclip core - media assembly engine.
//!
//! Turns a long-form source video, its subtitle track and a list of
//! timed expressions into short lesson artifacts. Everything that touches
//! media goes through `ffmpeg`/`ffprobe` subprocesses driven by this crate;
//! expression extraction, speech synthesis and uploading live elsewhere.

pub mod batch;
pub mod compose;
pub mod config;
pub mod context;
pub mod encode;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod probe;
pub mod subtitles;
pub mod tools;

pub use error::{ComposeError, ComposeResult};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
