//! Playback-side derivation
//!
//! Glue between position ticks from a player and the pure beat engine: a
//! per-song snapshot answering "where are we", a tracker that only reports
//! beat changes, and tap-tempo input.

pub mod beat_map;
pub mod tap;

pub use beat_map::{BeatMap, PlaybackPosition, PositionTracker};
pub use tap::TapTempo;
