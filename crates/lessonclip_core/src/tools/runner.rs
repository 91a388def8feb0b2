//! Execution of external media tools.
//!
//! Every ffmpeg/ffprobe process the engine starts goes through a
//! [`ToolRunner`]. The system runner spawns the real binaries; tests swap in
//! a scripted runner.

use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config::ToolSettings;
use crate::logging::JobLogger;

/// External tool kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Ffmpeg => write!(f, "ffmpeg"),
            Tool::Ffprobe => write!(f, "ffprobe"),
        }
    }
}

/// One tool run: which tool and its argument list (program name excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(tool: Tool, args: Vec<String>) -> Self {
        Self { tool, args }
    }

    /// Shell-like rendering for logs. Not meant to be re-parsed.
    pub fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == ';') {
                line.push('"');
                line.push_str(&arg.replace('"', "\\\""));
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    /// Last argument; for ffmpeg this is the output file, for ffprobe the input.
    pub fn target(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Errors from running an external tool.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: Tool,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with code {exit_code}: {}", .stderr_tail.join(" | "))]
    Failed {
        tool: Tool,
        exit_code: i32,
        stderr_tail: Vec<String>,
    },

    #[error("{tool} not started: job was cancelled")]
    Cancelled { tool: Tool },
}

/// Result type for tool runs.
pub type ToolResult<T> = Result<T, ToolError>;

/// Runs external tools. Exit code 0 is success, anything else is fatal.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation, logger: &JobLogger) -> ToolResult<ToolOutput>;
}

/// Runs the real ffmpeg/ffprobe binaries and waits for them.
#[derive(Debug, Clone)]
pub struct SystemToolRunner {
    ffmpeg: String,
    ffprobe: String,
}

impl SystemToolRunner {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            ffmpeg: settings.ffmpeg.clone(),
            ffprobe: settings.ffprobe.clone(),
        }
    }

    pub fn program(&self, tool: Tool) -> &str {
        match tool {
            Tool::Ffmpeg => &self.ffmpeg,
            Tool::Ffprobe => &self.ffprobe,
        }
    }
}

impl Default for SystemToolRunner {
    fn default() -> Self {
        Self::new(&ToolSettings::default())
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation, logger: &JobLogger) -> ToolResult<ToolOutput> {
        let program = self.program(invocation.tool);
        let tool = invocation.tool;

        logger.command(&invocation.command_line(program));
        tracing::debug!("Running {}: {:?}", tool, invocation.args);

        let result = Command::new(program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolError::Spawn { tool, source })?;

        let stdout = String::from_utf8_lossy(&result.stdout).to_string();
        let stderr = String::from_utf8_lossy(&result.stderr).to_string();

        // ffprobe's stdout is the JSON report, not progress output
        if tool == Tool::Ffmpeg {
            for line in stdout.lines() {
                logger.output_line(line, false);
            }
        }
        for line in stderr.lines() {
            logger.output_line(line, true);
        }

        if !result.status.success() {
            let exit_code = result.status.code().unwrap_or(-1);
            logger.show_tail(&tool.to_string());
            let keep = logger.config().error_tail.max(1);
            let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
            let stderr_tail = lines[lines.len().saturating_sub(keep)..]
                .iter()
                .map(|l| l.to_string())
                .collect();
            return Err(ToolError::Failed {
                tool,
                exit_code,
                stderr_tail,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogConfig;
    use tempfile::tempdir;

    #[test]
    fn command_line_quotes_awkward_args() {
        let inv = ToolInvocation::new(
            Tool::Ffmpeg,
            vec![
                "-i".to_string(),
                "/my clips/a.mp4".to_string(),
                "-filter_complex".to_string(),
                "[0:v]scale=-2:720[v];[v]null[o]".to_string(),
                "out.mp4".to_string(),
            ],
        );
        assert_eq!(
            inv.command_line("ffmpeg"),
            "ffmpeg -i \"/my clips/a.mp4\" -filter_complex \"[0:v]scale=-2:720[v];[v]null[o]\" out.mp4"
        );
        assert_eq!(inv.target(), Some("out.mp4"));
    }

    #[test]
    fn failed_error_shows_stderr_tail() {
        let err = ToolError::Failed {
            tool: Tool::Ffmpeg,
            exit_code: 1,
            stderr_tail: vec!["Invalid data".to_string(), "Conversion failed!".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "ffmpeg exited with code 1: Invalid data | Conversion failed!"
        );
    }

    #[test]
    fn missing_binary_is_spawn_error() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("job", dir.path(), LogConfig::default(), None).unwrap();
        let runner = SystemToolRunner::new(&ToolSettings {
            ffmpeg: "/nonexistent/ffmpeg-binary".to_string(),
            ffprobe: "/nonexistent/ffprobe-binary".to_string(),
        });

        let inv = ToolInvocation::new(Tool::Ffprobe, vec!["-version".to_string()]);
        let result = runner.run(&inv, &logger);
        assert!(matches!(
            result,
            Err(ToolError::Spawn {
                tool: Tool::Ffprobe,
                ..
            })
        ));
    }
}
