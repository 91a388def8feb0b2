//! Data models for the media assembly engine.
//!
//! - Enums for stream kinds, stacking orientation, timeline pieces
//! - Probed media (assets, video/audio parameters)
//! - Composition segments and source windows
//! - Audio timelines

mod enums;
pub(crate) mod media;
mod segments;
mod timeline;

pub use enums::{Orientation, StreamKind, TimelinePieceKind};
pub use media::{channel_layout_name, AudioParams, FrameRate, MediaAsset, VideoParams};
pub use segments::{CompositionSegment, SegmentKind, TimeRange};
pub use timeline::{AudioTimeline, TimelinePadding, TimelinePiece};
