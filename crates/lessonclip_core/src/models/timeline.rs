//! Audio timeline description (silence/speech pattern with exact totals).

use serde::{Deserialize, Serialize};

use super::enums::TimelinePieceKind;

/// One piece of an audio timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePiece {
    pub kind: TimelinePieceKind,
    pub duration_seconds: f64,
}

impl TimelinePiece {
    pub fn silence(duration_seconds: f64) -> Self {
        Self {
            kind: TimelinePieceKind::Silence,
            duration_seconds,
        }
    }

    pub fn speech(duration_seconds: f64) -> Self {
        Self {
            kind: TimelinePieceKind::Speech,
            duration_seconds,
        }
    }
}

/// Silence padding around repeated speech.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePadding {
    /// Silence before the first repetition.
    pub start_seconds: f64,
    /// Silence between repetitions.
    pub gap_seconds: f64,
    /// Silence after the last repetition.
    pub end_seconds: f64,
}

impl TimelinePadding {
    pub fn new(start_seconds: f64, gap_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            gap_seconds,
            end_seconds,
        }
    }

    /// Every silence is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.start_seconds, self.gap_seconds, self.end_seconds]
            .iter()
            .all(|s| s.is_finite() && *s >= 0.0)
    }
}

/// Ordered silence/speech pieces and their exact total duration.
///
/// `total_duration_seconds` is always the sum of the pieces; it is never
/// measured from a rendered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTimeline {
    pieces: Vec<TimelinePiece>,
    total_duration_seconds: f64,
}

impl AudioTimeline {
    /// Lay out `start, speech, (gap, speech) * (repeat - 1), end`.
    ///
    /// `repeat_count` of zero yields a timeline with only the outer silences;
    /// callers validate the count before rendering.
    pub fn repeated(speech_seconds: f64, repeat_count: u32, padding: TimelinePadding) -> Self {
        let mut pieces = Vec::with_capacity(2 * repeat_count as usize + 1);
        pieces.push(TimelinePiece::silence(padding.start_seconds));
        for i in 0..repeat_count {
            if i > 0 {
                pieces.push(TimelinePiece::silence(padding.gap_seconds));
            }
            pieces.push(TimelinePiece::speech(speech_seconds));
        }
        pieces.push(TimelinePiece::silence(padding.end_seconds));
        Self::from_pieces(pieces)
    }

    pub fn from_pieces(pieces: Vec<TimelinePiece>) -> Self {
        let total_duration_seconds = pieces.iter().map(|p| p.duration_seconds).sum();
        Self {
            pieces,
            total_duration_seconds,
        }
    }

    pub fn pieces(&self) -> &[TimelinePiece] {
        &self.pieces
    }

    pub fn total_duration_seconds(&self) -> f64 {
        self.total_duration_seconds
    }

    pub fn count(&self, kind: TimelinePieceKind) -> usize {
        self.pieces.iter().filter(|p| p.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_pattern_matches_formula() {
        let timeline = AudioTimeline::repeated(2.0, 3, TimelinePadding::new(1.0, 0.5, 1.0));
        assert!((timeline.total_duration_seconds() - 9.0).abs() < 1e-9);
        assert_eq!(timeline.count(TimelinePieceKind::Speech), 3);
        // start + 2 gaps + end
        assert_eq!(timeline.count(TimelinePieceKind::Silence), 4);
    }

    #[test]
    fn single_repetition_has_no_gap() {
        let timeline = AudioTimeline::repeated(1.5, 1, TimelinePadding::new(0.25, 9.0, 0.25));
        let kinds: Vec<_> = timeline.pieces().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TimelinePieceKind::Silence,
                TimelinePieceKind::Speech,
                TimelinePieceKind::Silence
            ]
        );
        assert!((timeline.total_duration_seconds() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn padding_validation() {
        assert!(TimelinePadding::new(0.0, 0.0, 0.0).is_valid());
        assert!(!TimelinePadding::new(-0.1, 0.0, 0.0).is_valid());
        assert!(!TimelinePadding::new(0.0, f64::NAN, 0.0).is_valid());
    }
}
