//! JSON export and import
//!
//! A single song exports as `{ "song": ..., "breakdown": ... }`; a bulk export
//! is an array of those pairs. Field names and 1-based counts are part of the
//! format, so exporting then importing reproduces the same data.

use crate::error::{EightcountError, Result};
use crate::store::{AnnotationStore, KeyValueStore};
use crate::types::{Breakdown, Song};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

/// Prefix for generated export file names
const FILE_PREFIX: &str = "eightcount";

/// One song with its annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongExport {
    pub song: Song,
    pub breakdown: Breakdown,
}

/// Either interchange shape, as found in a file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportFile {
    Many(Vec<SongExport>),
    Single(SongExport),
}

/// Export one song. A song without annotations gets an empty breakdown.
pub fn export_song<S: KeyValueStore>(store: &AnnotationStore<S>, song_ref: &str) -> Result<SongExport> {
    let song = store.require_song(song_ref)?;
    let breakdown = store.breakdown_or_empty(&song.id)?;
    Ok(SongExport { song, breakdown })
}

/// Export every song in catalogue order
pub fn export_all<S: KeyValueStore>(store: &AnnotationStore<S>) -> Result<Vec<SongExport>> {
    let mut breakdowns = store.breakdowns()?;
    let entries: Vec<SongExport> = store
        .songs()?
        .into_iter()
        .map(|song| {
            let breakdown = breakdowns
                .remove(&song.id)
                .unwrap_or_else(|| Breakdown::new(song.id.clone()));
            SongExport { song, breakdown }
        })
        .collect();

    debug!("Prepared export of {} songs", entries.len());
    Ok(entries)
}

/// Write any export payload as pretty JSON
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
/// This prevents data corruption if the write is interrupted.
pub fn write_json<T: Serialize + ?Sized>(data: &T, output_path: &Path) -> Result<()> {
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| EightcountError::output_error(output_path, e))?;

    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, data).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        EightcountError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        EightcountError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    debug!("Wrote {}", output_path.display());

    Ok(())
}

/// Read an interchange file holding one pair or an array of pairs
pub fn read_json(path: &Path) -> Result<Vec<SongExport>> {
    let file = File::open(path).map_err(|e| EightcountError::ImportError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let parsed: ExportFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| EightcountError::ImportError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let entries = match parsed {
        ExportFile::Many(entries) => entries,
        ExportFile::Single(entry) => vec![entry],
    };

    debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Lowercase, ASCII alphanumerics joined by single dashes
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Default file name for a single-song export
pub fn song_filename(song: &Song) -> String {
    format!("{}-{}.json", FILE_PREFIX, slugify(&song.title))
}

/// Default file name for a bulk export made on `date`
pub fn bulk_filename(date: NaiveDate) -> String {
    format!("{}-export-{}.json", FILE_PREFIX, date.format("%Y-%m-%d"))
}
