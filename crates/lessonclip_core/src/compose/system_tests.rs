//! Composition against the real `ffmpeg`/`ffprobe`. Each test returns early
//! when the tools or the h264/aac encoders are not installed.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use super::{apply_gain, concatenate};
use crate::config::Settings;
use crate::context::{test_context_with, JobContext};
use crate::models::MediaAsset;
use crate::probe::probe;
use crate::tools::SystemToolRunner;

fn tools_available() -> bool {
    let probe_ok = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    let encoders = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
        .map(|o| String::from_utf8_lossy(&o.stdout).to_string())
        .unwrap_or_default();
    probe_ok && encoders.contains("libx264") && encoders.contains(" aac ")
}

fn system_context() -> Option<(tempfile::TempDir, JobContext)> {
    if !tools_available() {
        eprintln!("ffmpeg/ffprobe with libx264 and aac not found; skipping");
        return None;
    }
    let settings = Settings::default();
    let runner = Arc::new(SystemToolRunner::new(&settings.tools));
    Some(test_context_with(runner, settings))
}

/// Render a test pattern with a sine tone.
fn synth(dir: &Path, name: &str, size: &str, seconds: f64) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "lavfi", "-i"])
        .arg(format!("testsrc=size={}:rate=25:duration={}", size, seconds))
        .args(["-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=440:sample_rate=48000:duration={}", seconds))
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-c:a", "aac", "-ac", "2", "-shortest"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success(), "could not synthesize {}", name);
    path
}

fn probed(ctx: &JobContext, path: &Path) -> MediaAsset {
    probe(ctx, path).unwrap()
}

/// Seconds that hold a whole number of 25 fps frames and 1024-sample AAC
/// frames at 48 kHz, so neither stream overhangs the other.
const ALIGNED_UNIT: f64 = 0.32;

/// md5 over the stream-copied video packets of `path`.
fn video_packet_md5(path: &Path) -> String {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-i"])
        .arg(path)
        .args(["-map", "0:v", "-c", "copy", "-f", "md5", "-"])
        .output()
        .unwrap();
    assert!(output.status.success(), "md5 of {} failed", path.display());
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn matching_clips_join_without_losing_time() {
    let Some((dir, ctx)) = system_context() else {
        return;
    };
    let a = probed(&ctx, &synth(dir.path(), "a.mp4", "320x240", 6.0 * ALIGNED_UNIT));
    let b = probed(&ctx, &synth(dir.path(), "b.mp4", "320x240", 9.0 * ALIGNED_UNIT));
    let output = dir.path().join("out").join("joined.mp4");

    let joined = concatenate(&ctx, &[a.clone(), b.clone()], &output).unwrap();

    assert!(output.exists());
    assert!(joined.has_nonempty_audio());
    let expected = a.duration_seconds + b.duration_seconds;
    assert!(
        (joined.duration_seconds - expected).abs() <= 0.05,
        "{} vs {}",
        joined.duration_seconds,
        expected
    );
}

#[test]
fn mismatched_clips_fall_back_to_filter_join() {
    let Some((dir, ctx)) = system_context() else {
        return;
    };
    let a = probed(&ctx, &synth(dir.path(), "small.mp4", "320x240", 2.0));
    let b = probed(&ctx, &synth(dir.path(), "large.mp4", "640x360", 2.0));
    let output = dir.path().join("mixed.mp4");

    let joined = concatenate(&ctx, &[a.clone(), b.clone()], &output).unwrap();

    assert!(joined.has_video());
    assert!(joined.has_nonempty_audio());
    let expected = a.duration_seconds + b.duration_seconds;
    assert!((joined.duration_seconds - expected).abs() <= 0.15);
}

#[test]
fn gain_keeps_video_and_duration() {
    let Some((dir, ctx)) = system_context() else {
        return;
    };
    let clip = probed(&ctx, &synth(dir.path(), "clip.mp4", "320x240", 6.0 * ALIGNED_UNIT));
    let output = dir.path().join("quiet.mp4");

    let quiet = apply_gain(&ctx, &clip, 0.5, &output).unwrap();

    assert!(quiet.has_nonempty_audio());
    assert_eq!(
        quiet.video.as_ref().map(|v| (v.codec.as_str(), v.width, v.height)),
        Some(("h264", 320, 240))
    );
    assert!((quiet.duration_seconds - clip.duration_seconds).abs() <= 0.05);
}

#[test]
fn unity_gain_keeps_video_packets() {
    let Some((dir, ctx)) = system_context() else {
        return;
    };
    let source = synth(dir.path(), "source.mp4", "320x240", 6.0 * ALIGNED_UNIT);
    let clip = probed(&ctx, &source);
    let output = dir.path().join("unity.mp4");

    let unity = apply_gain(&ctx, &clip, 1.0, &output).unwrap();

    assert!(unity.has_nonempty_audio());
    assert_eq!(video_packet_md5(&source), video_packet_md5(&output));
    assert!((unity.duration_seconds - clip.duration_seconds).abs() <= 0.05);
}
