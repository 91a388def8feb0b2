//! External tool plumbing: the runner seam and argument builders.

mod args;
mod runner;
#[cfg(test)]
pub(crate) mod scripted;

pub use args::{ffprobe_json, seconds_arg, FfmpegArgs};
pub use runner::{SystemToolRunner, Tool, ToolError, ToolInvocation, ToolOutput, ToolResult, ToolRunner};
