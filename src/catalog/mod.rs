//! Song catalogue helpers

pub mod track_ref;

pub use track_ref::{format_time, parse_spotify_track_id};
