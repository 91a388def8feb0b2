//! Scripted tool runner for tests.
//!
//! ffprobe answers from a table of registered assets. Each ffmpeg call pops
//! the next queued reply: either "produce" (touch the output file and make
//! it probe as the given media) or "fail" with an exit code.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;

use parking_lot::Mutex;
use serde_json::json;

use super::runner::{Tool, ToolError, ToolInvocation, ToolOutput, ToolResult, ToolRunner};
use crate::logging::JobLogger;
use crate::models::MediaAsset;

/// Outcome of one scripted ffmpeg call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Output probes as this asset (its path is replaced by the output path).
    Produce(MediaAsset),
    Fail(i32, &'static str),
}

#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<ToolInvocation>>,
    probes: Mutex<HashMap<PathBuf, String>>,
    replies: Mutex<VecDeque<Reply>>,
    default_reply: Mutex<Option<Reply>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `asset.path` probe as `asset`.
    pub fn register(&self, asset: &MediaAsset) {
        self.probes
            .lock()
            .insert(asset.path.clone(), probe_json(asset));
    }

    /// Register raw ffprobe output for a path.
    pub fn register_json(&self, path: impl Into<PathBuf>, json: impl Into<String>) {
        self.probes.lock().insert(path.into(), json.into());
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    /// Reply used once the queue is empty.
    pub fn set_default(&self, reply: Reply) {
        *self.default_reply.lock() = Some(reply);
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().clone()
    }

    pub fn ffmpeg_calls(&self) -> Vec<ToolInvocation> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.tool == Tool::Ffmpeg)
            .cloned()
            .collect()
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, invocation: &ToolInvocation, logger: &JobLogger) -> ToolResult<ToolOutput> {
        self.calls.lock().push(invocation.clone());
        logger.command(&invocation.command_line(&invocation.tool.to_string()));

        let target = PathBuf::from(invocation.target().unwrap_or_default());
        match invocation.tool {
            Tool::Ffprobe => match self.probes.lock().get(&target) {
                Some(json) => Ok(ToolOutput {
                    stdout: json.clone(),
                    stderr: String::new(),
                }),
                None => Err(ToolError::Failed {
                    tool: Tool::Ffprobe,
                    exit_code: 1,
                    stderr_tail: vec![format!("{}: No such file or directory", target.display())],
                }),
            },
            Tool::Ffmpeg => {
                let reply = self
                    .replies
                    .lock()
                    .pop_front()
                    .or_else(|| self.default_reply.lock().clone())
                    .unwrap_or(Reply::Fail(1, "unscripted ffmpeg call"));
                match reply {
                    Reply::Produce(mut asset) => {
                        std::fs::write(&target, b"scripted").map_err(|source| {
                            ToolError::Spawn {
                                tool: Tool::Ffmpeg,
                                source,
                            }
                        })?;
                        asset.path = target;
                        self.register(&asset);
                        Ok(ToolOutput::default())
                    }
                    Reply::Fail(exit_code, message) => {
                        logger.output_line(message, true);
                        Err(ToolError::Failed {
                            tool: Tool::Ffmpeg,
                            exit_code,
                            stderr_tail: vec![message.to_string()],
                        })
                    }
                }
            }
        }
    }
}

/// ffprobe-style JSON describing `asset`.
pub fn probe_json(asset: &MediaAsset) -> String {
    let duration = format!("{:.6}", asset.duration_seconds);
    let mut streams = Vec::new();
    if let Some(video) = &asset.video {
        let rate = video
            .frame_rate
            .map(|r| format!("{}/{}", r.num, r.den))
            .unwrap_or_else(|| "0/0".to_string());
        streams.push(json!({
            "index": streams.len(),
            "codec_name": video.codec,
            "codec_type": "video",
            "width": video.width,
            "height": video.height,
            "pix_fmt": video.pixel_format,
            "r_frame_rate": rate,
            "avg_frame_rate": rate,
            "duration": duration,
        }));
    }
    if let Some(audio) = &asset.audio {
        let audio_duration = audio
            .duration_seconds
            .map(|d| format!("{:.6}", d))
            .unwrap_or_else(|| duration.clone());
        streams.push(json!({
            "index": streams.len(),
            "codec_name": audio.codec,
            "codec_type": "audio",
            "sample_rate": audio.sample_rate_hz.to_string(),
            "channels": audio.channel_count,
            "duration": audio_duration,
        }));
    }
    json!({
        "streams": streams,
        "format": {
            "filename": asset.path.to_string_lossy(),
            "nb_streams": streams.len(),
            "duration": duration,
        }
    })
    .to_string()
}

/// Value that follows `flag` in an argument list.
pub fn arg_after<'a>(invocation: &'a ToolInvocation, flag: &str) -> Option<&'a str> {
    invocation
        .args
        .iter()
        .position(|a| a == flag)
        .and_then(|i| invocation.args.get(i + 1))
        .map(String::as_str)
}

/// Every value passed to `flag`, in order.
pub fn args_after<'a>(invocation: &'a ToolInvocation, flag: &str) -> Vec<&'a str> {
    invocation
        .args
        .windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}
