//! JSON interchange for songs and their annotations

pub mod json;

pub use json::{
    bulk_filename, export_all, export_song, read_json, slugify, song_filename, write_json, SongExport,
};
