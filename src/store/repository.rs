//! Song and breakdown repository
//!
//! Each song and each breakdown is decoded on its own. An entry that no
//! longer decodes is skipped on read and written back untouched, so one bad
//! record never takes its neighbours with it.

use crate::error::{EightcountError, Result};
use crate::export::SongExport;
use crate::store::backend::KeyValueStore;
use crate::types::{Breakdown, Song};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Key holding the song catalogue (array of songs)
pub const SONGS_KEY: &str = "eightcount:songs";
/// Key holding breakdowns (object keyed by song id)
pub const BREAKDOWNS_KEY: &str = "eightcount:breakdowns";

/// Repository for songs and their breakdowns
///
/// Breakdowns handed out by this store are normalised: count changes and
/// markers are sorted by beat, so they can go straight into the engine.
#[derive(Debug)]
pub struct AnnotationStore<S: KeyValueStore> {
    backend: S,
    /// Set once seeding has been attempted on this store
    initialized: bool,
}

impl<S: KeyValueStore> AnnotationStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            initialized: false,
        }
    }

    /// Whether [`seed_if_needed`](Self::seed_if_needed) has already run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    // =========================================================================
    // Songs
    // =========================================================================

    /// All readable songs in insertion order
    pub fn songs(&self) -> Result<Vec<Song>> {
        let documents: Vec<Value> = self.read_lenient(SONGS_KEY)?;
        Ok(documents
            .iter()
            .filter_map(|doc| self.decode(SONGS_KEY, doc))
            .collect())
    }

    /// Look a song up by id or Spotify id
    pub fn song(&self, id: &str) -> Result<Option<Song>> {
        Ok(self
            .songs()?
            .into_iter()
            .find(|s| s.id == id || s.spotify_id == id))
    }

    /// Like [`song`](Self::song), but a missing song is an error
    pub fn require_song(&self, id: &str) -> Result<Song> {
        self.song(id)?
            .ok_or_else(|| EightcountError::SongNotFound(id.to_string()))
    }

    /// Insert a song, or replace the one with the same Spotify id
    ///
    /// A replaced song keeps its stored id so its breakdown stays attached.
    /// Returns the song as stored.
    pub fn save_song(&mut self, mut song: Song) -> Result<Song> {
        let mut documents: Vec<Value> = self.read_for_update(SONGS_KEY)?;

        let existing = documents.iter_mut().find_map(|doc| {
            let stored = Song::deserialize(&*doc).ok()?;
            (stored.spotify_id == song.spotify_id).then_some((doc, stored.id))
        });

        match existing {
            Some((doc, id)) => {
                song.id = id;
                debug!("Updating song {} ({})", song.title, song.id);
                *doc = serde_json::to_value(&song)?;
            }
            None => {
                debug!("Adding song {} ({})", song.title, song.id);
                documents.push(serde_json::to_value(&song)?);
            }
        }

        self.backend.set(SONGS_KEY, Value::Array(documents))?;
        Ok(song)
    }

    /// Delete a song and its breakdown. Returns false if no such song existed.
    pub fn delete_song(&mut self, id: &str) -> Result<bool> {
        let Some(song) = self.song(id)? else {
            return Ok(false);
        };

        let mut documents: Vec<Value> = self.read_for_update(SONGS_KEY)?;
        documents.retain(|doc| Song::deserialize(doc).map_or(true, |s| s.id != song.id));
        self.backend.set(SONGS_KEY, Value::Array(documents))?;
        self.delete_breakdown(&song.id)?;

        info!("Deleted song {} and its breakdown", song.title);
        Ok(true)
    }

    // =========================================================================
    // Breakdowns
    // =========================================================================

    /// All readable breakdowns keyed by song id
    pub fn breakdowns(&self) -> Result<BTreeMap<String, Breakdown>> {
        let documents: Map<String, Value> = self.read_lenient(BREAKDOWNS_KEY)?;
        Ok(documents
            .iter()
            .filter_map(|(song_id, doc)| {
                let mut breakdown: Breakdown = self.decode(BREAKDOWNS_KEY, doc)?;
                breakdown.normalize();
                Some((song_id.clone(), breakdown))
            })
            .collect())
    }

    pub fn breakdown(&self, song_id: &str) -> Result<Option<Breakdown>> {
        Ok(self.breakdowns()?.remove(song_id))
    }

    /// Stored breakdown, or a fresh empty one for an unannotated song
    pub fn breakdown_or_empty(&self, song_id: &str) -> Result<Breakdown> {
        Ok(self
            .breakdown(song_id)?
            .unwrap_or_else(|| Breakdown::new(song_id)))
    }

    /// Persist a breakdown under its song id
    ///
    /// The breakdown is normalised first; `updated_at` is left as given so
    /// imports keep their timestamps. Editing methods on [`Breakdown`] stamp it.
    pub fn save_breakdown(&mut self, mut breakdown: Breakdown) -> Result<()> {
        if breakdown.normalize() {
            warn!("Repaired ordering or invalid values in breakdown for {}", breakdown.song_id);
        }

        let mut documents: Map<String, Value> = self.read_for_update(BREAKDOWNS_KEY)?;
        documents.insert(breakdown.song_id.clone(), serde_json::to_value(&breakdown)?);
        self.backend.set(BREAKDOWNS_KEY, Value::Object(documents))
    }

    pub fn delete_breakdown(&mut self, song_id: &str) -> Result<bool> {
        let mut documents: Map<String, Value> = self.read_for_update(BREAKDOWNS_KEY)?;
        let removed = documents.remove(song_id).is_some();
        if removed {
            self.backend.set(BREAKDOWNS_KEY, Value::Object(documents))?;
        }
        Ok(removed)
    }

    /// Load a song's breakdown, apply an edit, and persist it immediately
    ///
    /// Nothing is written if the edit fails.
    pub fn edit_breakdown<T, F>(&mut self, song_ref: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&Song, &mut Breakdown) -> Result<T>,
    {
        let song = self.require_song(song_ref)?;
        let mut breakdown = self.breakdown_or_empty(&song.id)?;

        let out = edit(&song, &mut breakdown)?;

        self.save_breakdown(breakdown)?;
        Ok(out)
    }

    // =========================================================================
    // Bulk loading
    // =========================================================================

    /// Load seed entries the first time this store is used, if it has no songs
    ///
    /// Runs at most once per store object. Returns the number of songs added.
    pub fn seed_if_needed(&mut self, entries: &[SongExport]) -> Result<usize> {
        if self.initialized {
            return Ok(0);
        }
        self.initialized = true;

        let mut songs: Vec<Value> = self.read_for_update(SONGS_KEY)?;
        if !songs.is_empty() {
            debug!("Store already has songs, skipping seed");
            return Ok(0);
        }

        let mut breakdowns: Map<String, Value> = self.read_for_update(BREAKDOWNS_KEY)?;
        let mut seeded: Vec<&str> = Vec::with_capacity(entries.len());

        for entry in entries {
            if seeded.contains(&entry.song.spotify_id.as_str()) {
                continue;
            }
            let mut breakdown = entry.breakdown.clone();
            breakdown.song_id = entry.song.id.clone();
            breakdown.normalize();

            songs.push(serde_json::to_value(&entry.song)?);
            breakdowns.insert(entry.song.id.clone(), serde_json::to_value(&breakdown)?);
            seeded.push(&entry.song.spotify_id);
        }

        self.backend.set(SONGS_KEY, Value::Array(songs))?;
        self.backend.set(BREAKDOWNS_KEY, Value::Object(breakdowns))?;

        info!("Seeded store with {} songs", seeded.len());
        Ok(seeded.len())
    }

    /// Upsert songs and breakdowns from interchange entries
    ///
    /// Returns the number of entries imported.
    pub fn import(&mut self, entries: Vec<SongExport>) -> Result<usize> {
        let count = entries.len();
        for entry in entries {
            let stored = self.save_song(entry.song)?;
            let mut breakdown = entry.breakdown;
            breakdown.song_id = stored.id;
            self.save_breakdown(breakdown)?;
        }
        info!("Imported {} songs", count);
        Ok(count)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Container under `key` for reading; an unexpected shape reads as empty
    fn read_lenient<C: DeserializeOwned + Default>(&self, key: &str) -> Result<C> {
        match self.read_for_update(key) {
            Err(EightcountError::UnreadableKey { reason, .. }) => {
                warn!("Ignoring unreadable '{}' in {} store: {}", key, self.backend.name(), reason);
                Ok(C::default())
            }
            other => other,
        }
    }

    /// Container under `key` for a read-modify-write
    ///
    /// Fails rather than reading as empty, so the write cannot replace data
    /// it did not understand.
    fn read_for_update<C: DeserializeOwned + Default>(&self, key: &str) -> Result<C> {
        let Some(value) = self.backend.get(key)? else {
            return Ok(C::default());
        };

        serde_json::from_value(value).map_err(|e| EightcountError::UnreadableKey {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode one entry, skipping it with a warning if it no longer fits
    fn decode<T: DeserializeOwned>(&self, key: &str, doc: &Value) -> Option<T> {
        match T::deserialize(doc) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping unreadable entry in '{}' ({} store): {}", key, self.backend.name(), e);
                None
            }
        }
    }
}
