//! Subtitle handling: SRT I/O and timestamp realignment.
//!
//! Context clips are cut out of a longer source, so the source's subtitle
//! track has to be moved onto the clip's own time base before it is burned
//! in. Everything here is pure except the file helpers.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use lessonclip_core::subtitles::realign_srt_file;
//!
//! // Clip starts at 120.5s on the source
//! let kept = realign_srt_file(
//!     Path::new("episode.srt"),
//!     Path::new("/tmp/job/context.srt"),
//!     120.5,
//!     None,
//! ).unwrap();
//! println!("{} cues kept", kept.len());
//! ```

mod align;
mod error;
mod srt;
mod types;

pub use align::{align, align_to_window};
pub use error::{ParseError, SubtitleError};
pub use srt::{format_srt_time, parse_srt, parse_srt_time, write_srt};
pub use types::SubtitleEntry;

use std::path::Path;

/// Read and parse an SRT file.
pub fn read_srt_file(path: &Path) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let content = std::fs::read_to_string(path).map_err(|e| SubtitleError::read(path, e))?;
    parse_srt(&content).map_err(|e| SubtitleError::parse(path, e))
}

/// Write entries to an SRT file.
pub fn write_srt_file(path: &Path, entries: &[SubtitleEntry]) -> Result<(), SubtitleError> {
    std::fs::write(path, write_srt(entries)).map_err(|e| SubtitleError::write(path, e))
}

/// Read `input`, realign it to a clip starting at `offset_seconds` (and
/// ending at `end_seconds`, when given), and write the result to `output`.
///
/// Returns the entries that were kept.
pub fn realign_srt_file(
    input: &Path,
    output: &Path,
    offset_seconds: f64,
    end_seconds: Option<f64>,
) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let entries = read_srt_file(input)?;
    let aligned = match end_seconds {
        Some(end) => align_to_window(&entries, offset_seconds, end),
        None => align(&entries, offset_seconds),
    };
    tracing::debug!(
        "Realigned {} -> {} cues at offset {:.3}s",
        entries.len(),
        aligned.len(),
        offset_seconds
    );
    write_srt_file(output, &aligned)?;
    Ok(aligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn realigns_file_on_disk() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.srt");
        let output = dir.path().join("out.srt");
        fs::write(
            &input,
            "1\n00:00:10,000 --> 00:00:15,000\nearly\n\n2\n00:02:05,000 --> 00:02:07,000\nx\n",
        )
        .unwrap();

        let kept = realign_srt_file(&input, &output, 120.5, None).unwrap();
        assert_eq!(kept.len(), 1);

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(written, "2\n00:00:04,500 --> 00:00:06,500\nx\n");
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = read_srt_file(Path::new("/nonexistent/subs.srt"));
        assert!(matches!(result, Err(SubtitleError::ReadError { .. })));
    }
}
