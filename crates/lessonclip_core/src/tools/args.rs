//! Builders for ffmpeg and ffprobe argument lists.

use std::path::Path;

use super::runner::{Tool, ToolInvocation};

/// Accumulates an ffmpeg command line.
///
/// Global flags are fixed: overwrite, no stdin, errors only. Inputs are
/// numbered in the order they are added; [`FfmpegArgs::input`] returns the
/// index to use in `-map` and filter labels.
#[derive(Debug, Clone)]
pub struct FfmpegArgs {
    args: Vec<String>,
    inputs: usize,
}

impl FfmpegArgs {
    pub fn new() -> Self {
        let args = ["-hide_banner", "-nostdin", "-y", "-v", "error"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self { args, inputs: 0 }
    }

    /// Add an input file; returns its input index.
    pub fn input(&mut self, path: &Path) -> usize {
        self.input_with(&[], path)
    }

    /// Add an input preceded by input options (`-ss`, `-f concat`, ...).
    pub fn input_with(&mut self, options: &[&str], path: &Path) -> usize {
        self.args.extend(options.iter().map(|s| s.to_string()));
        self.args.push("-i".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self.next_input()
    }

    /// Add a lavfi source (e.g. `anullsrc=...`) as an input.
    pub fn lavfi(&mut self, graph: &str) -> usize {
        self.args.extend(["-f", "lavfi", "-i"].iter().map(|s| s.to_string()));
        self.args.push(graph.to_string());
        self.next_input()
    }

    pub fn input_count(&self) -> usize {
        self.inputs
    }

    pub fn opt(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.args.push(key.to_string());
        self.args.push(value.to_string());
        self
    }

    /// `-map <spec>`.
    pub fn map(&mut self, spec: impl ToString) -> &mut Self {
        self.opt("-map", spec)
    }

    pub fn filter_complex(&mut self, graph: &str) -> &mut Self {
        self.opt("-filter_complex", graph)
    }

    pub fn extend(&mut self, args: impl IntoIterator<Item = String>) -> &mut Self {
        self.args.extend(args);
        self
    }

    /// Finish with the output file.
    pub fn output(mut self, path: &Path) -> ToolInvocation {
        self.args.push(path.to_string_lossy().to_string());
        ToolInvocation::new(Tool::Ffmpeg, self.args)
    }

    fn next_input(&mut self) -> usize {
        self.inputs += 1;
        self.inputs - 1
    }
}

impl Default for FfmpegArgs {
    fn default() -> Self {
        Self::new()
    }
}

/// `ffprobe` invocation that prints format and streams as JSON.
pub fn ffprobe_json(path: &Path) -> ToolInvocation {
    let mut args: Vec<String> = [
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(path.to_string_lossy().to_string());
    ToolInvocation::new(Tool::Ffprobe, args)
}

/// Format seconds for `-ss`/`-t` with millisecond precision.
pub fn seconds_arg(seconds: f64) -> String {
    format!("{:.3}", seconds.max(0.0))
}
