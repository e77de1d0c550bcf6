//! Beat engine
//!
//! Pure conversions between wall-clock playback position and beat / eight-count
//! space. Nothing here holds state or performs I/O: every result is a function
//! of the arguments, so callers recompute freely on each position tick.
//!
//! Inputs are trusted as given. Tempo and first-beat offset come from the user;
//! count changes and markers must already be sorted by beat (the store keeps
//! them that way).

pub mod counts;
pub mod segments;
pub mod time;

pub use counts::{count_at_ms, count_for_beat, generate_counts};
pub use segments::{segment_index_for_beat, structure_segments, DEFAULT_SEGMENT_BEATS};
pub use time::{beat_interval_ms, beat_to_ms, ms_to_beat, nearest_beat, total_beats};
