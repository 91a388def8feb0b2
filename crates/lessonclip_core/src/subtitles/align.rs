//! Realign subtitle entries to a re-sliced clip's local time base.

use super::types::SubtitleEntry;

/// Shift entries so `offset_seconds` on the source becomes 0 in the clip.
///
/// - Entries ending at or before the offset are dropped.
/// - Remaining entries are shifted back by the offset; a start that lands
///   before 0 is clamped to 0 (the cue is shown from the clip's first frame).
///
/// Order is preserved.
pub fn align(entries: &[SubtitleEntry], offset_seconds: f64) -> Vec<SubtitleEntry> {
    entries
        .iter()
        .filter(|e| e.end_seconds > offset_seconds)
        .map(|e| SubtitleEntry {
            start_seconds: (e.start_seconds - offset_seconds).max(0.0),
            end_seconds: e.end_seconds - offset_seconds,
            ..e.clone()
        })
        .filter(|e| e.end_seconds > e.start_seconds)
        .collect()
}

/// Like [`align`], but also trims to a clip ending at `end_seconds` on the
/// source: entries starting at or after the clip end are dropped and ends
/// are clamped to the clip length.
pub fn align_to_window(
    entries: &[SubtitleEntry],
    start_seconds: f64,
    end_seconds: f64,
) -> Vec<SubtitleEntry> {
    let clip_length = end_seconds - start_seconds;
    align(entries, start_seconds)
        .into_iter()
        .filter(|e| e.start_seconds < clip_length)
        .map(|mut e| {
            e.end_seconds = e.end_seconds.min(clip_length);
            e
        })
        .filter(|e| e.end_seconds > e.start_seconds)
        .collect()
}
