//! Media probing with `ffprobe`.
//!
//! Only the first video and the first audio stream are described; every
//! other stream is ignored by the engine.

use std::path::Path;

use serde::Deserialize;

use crate::context::JobContext;
use crate::error::{ComposeError, ComposeResult};
use crate::models::{AudioParams, FrameRate, MediaAsset, VideoParams};
use crate::tools::{ffprobe_json, ToolError};

/// Probe `path` into a [`MediaAsset`].
///
/// Fails if the file cannot be opened, has no streams, has neither video
/// nor audio, or ffprobe's report is malformed.
pub fn probe(ctx: &JobContext, path: &Path) -> ComposeResult<MediaAsset> {
    if !path.exists() {
        return Err(ComposeError::probe(path, "file does not exist"));
    }

    let output = ctx.run(&ffprobe_json(path)).map_err(|e| match e {
        ToolError::Cancelled { .. } => ctx.cancelled(),
        other => ComposeError::probe(path, other),
    })?;

    let asset = parse_probe_json(&output.stdout, path)?;
    tracing::debug!("Probed {}", asset.summary());
    Ok(asset)
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse ffprobe's `-print_format json -show_format -show_streams` output.
pub fn parse_probe_json(json: &str, path: &Path) -> ComposeResult<MediaAsset> {
    let report: ProbeReport = serde_json::from_str(json)
        .map_err(|e| ComposeError::probe(path, format!("malformed ffprobe output: {}", e)))?;

    if report.streams.is_empty() {
        return Err(ComposeError::probe(path, "file has no streams"));
    }

    let first_of = |kind: &str| {
        report
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(kind))
    };

    let video = first_of("video").map(parse_video).transpose().map_err(|m| ComposeError::probe(path, m))?;
    let audio = first_of("audio").map(parse_audio).transpose().map_err(|m| ComposeError::probe(path, m))?;

    if video.is_none() && audio.is_none() {
        return Err(ComposeError::probe(path, "file has neither video nor audio"));
    }

    let format_duration = report
        .format
        .as_ref()
        .and_then(|f| parse_seconds(f.duration.as_deref()));
    let longest_stream = report
        .streams
        .iter()
        .filter_map(|s| parse_seconds(s.duration.as_deref()))
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));
    let duration_seconds = format_duration
        .or(longest_stream)
        .ok_or_else(|| ComposeError::probe(path, "duration not reported"))?;

    Ok(MediaAsset {
        path: path.to_path_buf(),
        duration_seconds,
        video,
        audio,
    })
}

fn parse_video(stream: &ProbeStream) -> Result<VideoParams, String> {
    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) => (w, h),
        _ => return Err("video stream without dimensions".to_string()),
    };
    let frame_rate = stream
        .r_frame_rate
        .as_deref()
        .and_then(FrameRate::parse)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(FrameRate::parse));

    Ok(VideoParams {
        codec: stream.codec_name.clone().unwrap_or_default(),
        width,
        height,
        pixel_format: stream.pix_fmt.clone().unwrap_or_default(),
        frame_rate,
    })
}

fn parse_audio(stream: &ProbeStream) -> Result<AudioParams, String> {
    let sample_rate_hz = stream
        .sample_rate
        .as_deref()
        .and_then(|r| r.parse::<u32>().ok())
        .ok_or_else(|| "audio stream without sample rate".to_string())?;

    Ok(AudioParams {
        codec: stream.codec_name.clone().unwrap_or_default(),
        channel_count: stream.channels.unwrap_or(0),
        sample_rate_hz,
        duration_seconds: parse_seconds(stream.duration.as_deref()),
    })
}

/// ffprobe reports durations as decimal strings, or `N/A`.
fn parse_seconds(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use crate::models::media::fixtures;
    use crate::tools::scripted::{probe_json, ScriptedRunner};
    use std::path::PathBuf;
    use std::sync::Arc;

    const REPORT: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "width": 1280, "height": 720,
             "pix_fmt": "yuv420p", "r_frame_rate": "30000/1001", "avg_frame_rate": "30000/1001",
             "duration": "12.012000"},
            {"index": 1, "codec_name": "aac", "codec_type": "audio", "sample_rate": "44100",
             "channels": 2, "duration": "12.000000"},
            {"index": 2, "codec_name": "aac", "codec_type": "audio", "sample_rate": "48000",
             "channels": 6}
        ],
        "format": {"filename": "a.mp4", "duration": "12.034000"}
    }"#;

    #[test]
    fn parses_first_video_and_audio() {
        let asset = parse_probe_json(REPORT, Path::new("/a.mp4")).unwrap();
        assert!((asset.duration_seconds - 12.034).abs() < 1e-9);

        let video = asset.video.unwrap();
        assert_eq!((video.width, video.height), (1280, 720));
        assert_eq!(video.frame_rate, Some(FrameRate::new(30000, 1001)));

        let audio = asset.audio.unwrap();
        assert_eq!(audio.sample_rate_hz, 44100);
        assert_eq!(audio.channel_count, 2);
        assert_eq!(audio.duration_seconds, Some(12.0));
    }

    #[test]
    fn duration_falls_back_to_longest_stream() {
        let json = r#"{"streams": [
            {"codec_type": "audio", "codec_name": "mp3", "sample_rate": "48000", "channels": 1, "duration": "3.5"},
            {"codec_type": "video", "codec_name": "png", "width": 10, "height": 10, "duration": "N/A"}
        ], "format": {"duration": "N/A"}}"#;
        let asset = parse_probe_json(json, Path::new("/a.mp3")).unwrap();
        assert!((asset.duration_seconds - 3.5).abs() < 1e-9);
        assert!(asset.has_video());
    }

    #[test]
    fn rejects_reports_without_media() {
        let no_streams = r#"{"streams": [], "format": {"duration": "1.0"}}"#;
        let err = parse_probe_json(no_streams, Path::new("/x")).unwrap_err();
        assert!(err.to_string().contains("no streams"));

        let subtitles_only = r#"{"streams": [{"codec_type": "subtitle", "codec_name": "mov_text"}],
                                 "format": {"duration": "1.0"}}"#;
        let err = parse_probe_json(subtitles_only, Path::new("/x")).unwrap_err();
        assert!(err.to_string().contains("neither video nor audio"));

        assert!(matches!(
            parse_probe_json("not json", Path::new("/x")),
            Err(ComposeError::Probe { .. })
        ));
    }

    #[test]
    fn probe_runs_ffprobe_through_context() {
        let runner = Arc::new(ScriptedRunner::new());
        let (dir, ctx) = test_context(runner.clone());

        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"").unwrap();
        let mut expected = fixtures::clip("", 4.0);
        expected.path = path.clone();
        runner.register_json(&path, probe_json(&expected));

        let asset = probe(&ctx, &path).unwrap();
        assert_eq!(asset.video, expected.video);
        assert!((asset.duration_seconds - 4.0).abs() < 1e-9);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn missing_file_is_probe_error() {
        let runner = Arc::new(ScriptedRunner::new());
        let (_dir, ctx) = test_context(runner.clone());
        let result = probe(&ctx, &PathBuf::from("/definitely/not/here.mp4"));
        assert!(matches!(result, Err(ComposeError::Probe { .. })));
        assert!(runner.calls().is_empty());
    }
}
