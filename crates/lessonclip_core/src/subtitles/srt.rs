//! SRT reader and writer.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! Hello, world!
//!
//! 2
//! 00:00:05,000 --> 00:00:08,000
//! This is a test.
//! ```
//!
//! Rewriting keeps entry order, original indices and cue text exactly;
//! only the timing line is regenerated.

use super::error::ParseError;
use super::types::SubtitleEntry;

/// Parse SRT content into entries, in file order.
///
/// Blocks without a timing line are skipped. A block whose timing line is
/// malformed is an error.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>, ParseError> {
    let mut entries = Vec::new();
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }

        // Collect one block
        let block_start = i;
        while i < lines.len() && !lines[i].trim().is_empty() {
            i += 1;
        }
        let block = &lines[block_start..i];

        let Some(timing_idx) = block.iter().position(|l| l.contains("-->")) else {
            tracing::debug!("Skipping SRT block without timing at line {}", block_start + 1);
            continue;
        };

        let line_number = block_start + timing_idx + 1;
        let (start, end) = parse_timing_line(block[timing_idx])
            .ok_or_else(|| ParseError::invalid_time(line_number, block[timing_idx].trim()))?;
        if end < start {
            return Err(ParseError::InvertedCue { line: line_number });
        }

        let index = if timing_idx > 0 {
            block[timing_idx - 1].trim().parse::<u32>().ok()
        } else {
            None
        };

        let text = block[timing_idx + 1..].join("\n");

        entries.push(SubtitleEntry {
            index,
            start_seconds: start,
            end_seconds: end,
            text,
        });
    }

    Ok(entries)
}

/// Write entries as SRT.
///
/// Entries keep their original index; entries without one get their
/// 1-based position.
pub fn write_srt(entries: &[SubtitleEntry]) -> String {
    let mut output = String::new();

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let index = entry.index.unwrap_or(i as u32 + 1);
        output.push_str(&format!("{}\n", index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(entry.start_seconds),
            format_srt_time(entry.end_seconds)
        ));
        output.push_str(&entry.text);
        output.push('\n');
    }

    output
}

/// Parse `HH:MM:SS,mmm --> HH:MM:SS,mmm` into seconds.
fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once("-->")?;
    // Position settings may follow the end time
    let end = end.split_whitespace().next()?;
    Some((parse_srt_time(start)?, parse_srt_time(end)?))
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm` or `HH:MM:SS.mmm`) into seconds.
pub fn parse_srt_time(s: &str) -> Option<f64> {
    let s = s.trim().replace(',', ".");

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: u64 = parts[0].parse().ok()?;
    let minutes: u64 = parts[1].parse().ok()?;

    let (secs_str, frac_str) = parts[2].split_once('.').unwrap_or((parts[2], ""));
    let seconds: u64 = secs_str.parse().ok()?;

    let millis: f64 = if frac_str.is_empty() {
        0.0
    } else {
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value: f64 = frac_str.parse().ok()?;
        value / 10f64.powi(frac_str.len() as i32) * 1000.0
    };

    let whole_ms = hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1000)?)?;
    Some((whole_ms as f64 + millis) / 1000.0)
}

/// Format seconds as `HH:MM:SS,mmm`, rounded to the nearest millisecond.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round().max(0.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}
