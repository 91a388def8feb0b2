//! Composition segments and source time windows.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::media::MediaAsset;
use super::timeline::AudioTimeline;
use crate::subtitles::SubtitleEntry;

/// A `[start, end)` window on a source's timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TimeRange {
    pub fn new(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Finite, non-negative start and strictly positive length.
    pub fn is_valid(&self) -> bool {
        self.start_seconds.is_finite()
            && self.end_seconds.is_finite()
            && self.start_seconds >= 0.0
            && self.end_seconds > self.start_seconds
    }
}

/// What a segment is made of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentKind {
    /// Slice of the source around an expression, with realigned subtitles.
    ContextClip {
        asset: MediaAsset,
        subtitle_entries: Vec<SubtitleEntry>,
    },
    /// The expression itself, played `repeat_count` times back to back.
    RepeatedExpression { asset: MediaAsset, repeat_count: u32 },
    /// Still background under a silence-padded speech timeline.
    EducationalSlide {
        background: PathBuf,
        audio_timeline: AudioTimeline,
    },
}

/// One piece of a composition, plus its rendered output once available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSegment {
    pub kind: SegmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered: Option<MediaAsset>,
}

impl CompositionSegment {
    pub fn new(kind: SegmentKind) -> Self {
        Self {
            kind,
            rendered: None,
        }
    }

    /// A segment that is already a finished file (e.g. a short-form clip).
    pub fn finished(kind: SegmentKind, rendered: MediaAsset) -> Self {
        Self {
            kind,
            rendered: Some(rendered),
        }
    }

    pub fn with_rendered(mut self, rendered: MediaAsset) -> Self {
        self.rendered = Some(rendered);
        self
    }

    /// Playable duration: the rendered file's when known, otherwise the
    /// duration implied by the segment's inputs.
    pub fn duration_seconds(&self) -> f64 {
        if let Some(ref rendered) = self.rendered {
            return rendered.duration_seconds;
        }
        match &self.kind {
            SegmentKind::ContextClip { asset, .. } => asset.duration_seconds,
            SegmentKind::RepeatedExpression {
                asset,
                repeat_count,
            } => asset.duration_seconds * *repeat_count as f64,
            SegmentKind::EducationalSlide { audio_timeline, .. } => {
                audio_timeline.total_duration_seconds()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            SegmentKind::ContextClip { .. } => "context",
            SegmentKind::RepeatedExpression { .. } => "repeated",
            SegmentKind::EducationalSlide { .. } => "slide",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::fixtures;
    use crate::models::timeline::TimelinePadding;

    #[test]
    fn time_range_validation() {
        assert!(TimeRange::new(1.0, 2.0).is_valid());
        assert!(!TimeRange::new(2.0, 2.0).is_valid());
        assert!(!TimeRange::new(-1.0, 2.0).is_valid());
        assert!((TimeRange::new(1.5, 4.0).duration_seconds() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn duration_prefers_rendered_output() {
        let segment = CompositionSegment::new(SegmentKind::RepeatedExpression {
            asset: fixtures::clip("/expr.mp4", 1.5),
            repeat_count: 3,
        });
        assert!((segment.duration_seconds() - 4.5).abs() < 1e-9);

        let segment = segment.with_rendered(fixtures::clip("/rendered.mp4", 4.52));
        assert!((segment.duration_seconds() - 4.52).abs() < 1e-9);
    }

    #[test]
    fn slide_duration_comes_from_timeline() {
        let segment = CompositionSegment::new(SegmentKind::EducationalSlide {
            background: PathBuf::from("/bg.png"),
            audio_timeline: AudioTimeline::repeated(2.0, 3, TimelinePadding::new(1.0, 0.5, 1.0)),
        });
        assert!((segment.duration_seconds() - 9.0).abs() < 1e-9);
        assert_eq!(segment.label(), "slide");
    }
}
