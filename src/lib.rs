//! eightcount - Beat and eight-count annotations for dancers
//!
//! A dancer plays a track, declares its tempo and first beat, and tags the
//! song with sections, breaks and accents. Where the music shifts, a count
//! reset re-synchronises the eight-count. Annotations persist locally and
//! export as JSON.
//!
//! # Architecture
//!
//! - `engine`: pure time ↔ beat conversion, count derivation, segmentation
//! - `types`: songs, breakdowns, markers and count resets
//! - `store`: repository over a swappable key-value backend
//! - `session`: playback-side derivation (beat map, tick tracking, tap tempo)
//! - `export`: JSON interchange
//! - `catalog`: track references and time display
//! - `config`: CLI argument parsing and runtime settings
//!
//! # Example
//!
//! ```
//! use eightcount::engine::{count_for_beat, ms_to_beat};
//! use eightcount::types::{BeatPosition, Breakdown};
//!
//! let mut breakdown = Breakdown::new("song");
//! breakdown.set_bpm(120.0).unwrap();
//! breakdown.set_first_beat_ms(1000);
//! breakdown.upsert_count_change(10, 5).unwrap();
//!
//! let beat = ms_to_beat(6_000, breakdown.bpm, breakdown.first_beat_ms);
//! assert_eq!(beat, BeatPosition::Beat(10));
//! assert_eq!(count_for_beat(10, &breakdown.count_changes), 5);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod session;
pub mod store;
pub mod types;

// Re-export key types at crate root
pub use error::{EightcountError, Result};
pub use types::{BeatPosition, Breakdown, CountChange, Marker, MarkerType, Song, StructureSegment};
