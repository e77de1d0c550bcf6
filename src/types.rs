//! Core data types for eightcount
//!
//! These types represent the annotation model. Their serde shape is the
//! interchange format: camelCase field names, 1-based counts.

use crate::error::{EightcountError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of beats in a dance count cycle
pub const COUNTS_PER_CYCLE: u8 = 8;

/// Highest tempo accepted. Beat tables are sized by tempo × duration.
pub const MAX_BPM: f64 = 1000.0;

// =============================================================================
// Beat-space values
// =============================================================================

/// A beat index derived from a wall-clock position
///
/// `NoBeat` means "no tempo configured" or "before the first beat". It never
/// takes part in arithmetic; use [`BeatPosition::index`] to get at the beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeatPosition {
    NoBeat,
    Beat(u64),
}

impl BeatPosition {
    /// The beat index, if there is one
    pub fn index(self) -> Option<u64> {
        match self {
            BeatPosition::NoBeat => None,
            BeatPosition::Beat(index) => Some(index),
        }
    }

    pub fn is_beat(self) -> bool {
        matches!(self, BeatPosition::Beat(_))
    }

    /// Legacy integer form: the beat index, or -1 for `NoBeat`
    pub fn to_sentinel(self) -> i64 {
        match self {
            BeatPosition::NoBeat => -1,
            BeatPosition::Beat(index) => index as i64,
        }
    }
}

/// A contiguous run of beats `[start_beat, end_beat)` on the song timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureSegment {
    pub start_beat: u64,
    pub end_beat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl StructureSegment {
    /// Number of beats covered
    pub fn len(&self) -> u64 {
        self.end_beat.saturating_sub(self.start_beat)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, beat: u64) -> bool {
        beat >= self.start_beat && beat < self.end_beat
    }
}

// =============================================================================
// Markers
// =============================================================================

/// Kind of annotation attached to a beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
    Section,
    Break,
    Accent,
}

/// Display metadata for a marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerConfig {
    pub label: &'static str,
    pub color: &'static str,
    pub shortcut: char,
}

impl MarkerType {
    pub const ALL: [MarkerType; 3] = [MarkerType::Section, MarkerType::Break, MarkerType::Accent];

    /// Display label, colour and keyboard shortcut for this marker type
    pub fn config(self) -> MarkerConfig {
        match self {
            MarkerType::Section => MarkerConfig {
                label: "Section",
                color: "#10B981",
                shortcut: '1',
            },
            MarkerType::Break => MarkerConfig {
                label: "Break",
                color: "#EF4444",
                shortcut: '2',
            },
            MarkerType::Accent => MarkerConfig {
                label: "Accent",
                color: "#F59E0B",
                shortcut: '3',
            },
        }
    }

    /// Marker type bound to a keyboard shortcut
    pub fn from_shortcut(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.config().shortcut == key)
    }

    /// Parse the interchange name ("section", "break", "accent")
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "section" => Some(MarkerType::Section),
            "break" => Some(MarkerType::Break),
            "accent" => Some(MarkerType::Accent),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MarkerType::Section => "section",
            MarkerType::Break => "break",
            MarkerType::Accent => "accent",
        }
    }
}

/// The fixed vocabulary of section names
///
/// Section markers may also carry free text; that simply has no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionLabel {
    Intro,
    Verse,
    PreChorus,
    Chorus,
    Mambo,
    Bridge,
    Outro,
}

impl SectionLabel {
    pub const ALL: [SectionLabel; 7] = [
        SectionLabel::Intro,
        SectionLabel::Verse,
        SectionLabel::PreChorus,
        SectionLabel::Chorus,
        SectionLabel::Mambo,
        SectionLabel::Bridge,
        SectionLabel::Outro,
    ];

    /// Match a label against the vocabulary (case-insensitive)
    pub fn parse(label: &str) -> Option<Self> {
        let wanted = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|l| l.as_str() == wanted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionLabel::Intro => "intro",
            SectionLabel::Verse => "verse",
            SectionLabel::PreChorus => "pre-chorus",
            SectionLabel::Chorus => "chorus",
            SectionLabel::Mambo => "mambo",
            SectionLabel::Bridge => "bridge",
            SectionLabel::Outro => "outro",
        }
    }

    /// Block colour used when painting this section on a timeline
    pub fn color(self) -> &'static str {
        match self {
            SectionLabel::Intro => "#7DD3FC",
            SectionLabel::Verse => "#FB923C",
            SectionLabel::PreChorus => "#F472B6",
            SectionLabel::Chorus => "#86EFAC",
            SectionLabel::Mambo => "#3B82F6",
            SectionLabel::Bridge => "#C084FC",
            SectionLabel::Outro => "#94A3B8",
        }
    }
}

/// An annotation pinned to a beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub beat_index: u64,
    #[serde(rename = "type")]
    pub marker_type: MarkerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Marker {
    pub fn new(beat_index: u64, marker_type: MarkerType, label: Option<String>) -> Self {
        Self {
            id: new_id(),
            beat_index,
            marker_type,
            label: label.filter(|l| !l.trim().is_empty()),
        }
    }

    /// Vocabulary entry for a section marker's label, if it is one
    pub fn section_label(&self) -> Option<SectionLabel> {
        match self.marker_type {
            MarkerType::Section => self.label.as_deref().and_then(SectionLabel::parse),
            _ => None,
        }
    }
}

// =============================================================================
// Count resets
// =============================================================================

/// Restart of the eight-count at a given beat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountChange {
    pub id: String,
    pub beat_index: u64,
    /// Count assigned to `beat_index` itself (1-8)
    pub reset_to: u8,
}

impl CountChange {
    pub fn new(beat_index: u64, reset_to: u8) -> Result<Self> {
        validate_reset_to(reset_to)?;
        Ok(Self {
            id: new_id(),
            beat_index,
            reset_to,
        })
    }
}

fn validate_reset_to(reset_to: u8) -> Result<()> {
    if (1..=COUNTS_PER_CYCLE).contains(&reset_to) {
        Ok(())
    } else {
        Err(EightcountError::InvalidResetTo(reset_to))
    }
}

// =============================================================================
// Songs and breakdowns
// =============================================================================

/// Catalogue entry for a streamed track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub spotify_id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub album_art: String,
    pub duration_ms: u64,
    pub added_at: DateTime<Utc>,
}

impl Song {
    pub fn new(spotify_id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: new_id(),
            spotify_id: spotify_id.into(),
            title: title.into(),
            artist: artist.into(),
            album_art: String::new(),
            duration_ms,
            added_at: Utc::now(),
        }
    }
}

/// All annotations for one song
///
/// Every mutating method leaves `count_changes` and `markers` sorted by beat,
/// which the beat engine takes as a precondition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub song_id: String,
    /// Beats per minute; 0 means no tempo configured
    #[serde(default)]
    pub bpm: f64,
    /// Position of beat 0 in milliseconds
    #[serde(default)]
    pub first_beat_ms: u64,
    #[serde(default)]
    pub count_changes: Vec<CountChange>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Breakdown {
    /// Empty breakdown with no tempo
    pub fn new(song_id: impl Into<String>) -> Self {
        Self {
            song_id: song_id.into(),
            bpm: 0.0,
            first_beat_ms: 0,
            count_changes: Vec::new(),
            markers: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether a usable tempo is set
    pub fn has_tempo(&self) -> bool {
        self.bpm > 0.0
    }

    /// Declare the tempo. 0 clears it.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        if !(0.0..=MAX_BPM).contains(&bpm) {
            return Err(EightcountError::InvalidBpm(bpm));
        }
        self.bpm = bpm;
        self.touch();
        Ok(())
    }

    pub fn set_first_beat_ms(&mut self, first_beat_ms: u64) {
        self.first_beat_ms = first_beat_ms;
        self.touch();
    }

    /// Add a count reset, replacing any reset already on that beat
    pub fn upsert_count_change(&mut self, beat_index: u64, reset_to: u8) -> Result<&CountChange> {
        validate_reset_to(reset_to)?;

        let id = match self.count_changes.iter_mut().find(|c| c.beat_index == beat_index) {
            Some(existing) => {
                existing.reset_to = reset_to;
                existing.id.clone()
            }
            None => {
                let change = CountChange::new(beat_index, reset_to)?;
                let id = change.id.clone();
                self.count_changes.push(change);
                id
            }
        };

        self.sort_count_changes();
        self.touch();
        self.count_change_by_id(&id)
    }

    /// Move or re-value an existing reset. A reset already sitting on the
    /// target beat is replaced by this one.
    pub fn update_count_change(&mut self, id: &str, beat_index: u64, reset_to: u8) -> Result<()> {
        validate_reset_to(reset_to)?;
        if !self.count_changes.iter().any(|c| c.id == id) {
            return Err(self.count_change_not_found(id));
        }

        self.count_changes.retain(|c| c.id == id || c.beat_index != beat_index);
        if let Some(change) = self.count_changes.iter_mut().find(|c| c.id == id) {
            change.beat_index = beat_index;
            change.reset_to = reset_to;
        }

        self.sort_count_changes();
        self.touch();
        Ok(())
    }

    pub fn remove_count_change(&mut self, id: &str) -> Result<CountChange> {
        let pos = self
            .count_changes
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| self.count_change_not_found(id))?;
        self.touch();
        Ok(self.count_changes.remove(pos))
    }

    /// Insert a marker, keeping markers ordered by beat
    pub fn add_marker(&mut self, beat_index: u64, marker_type: MarkerType, label: Option<String>) -> &Marker {
        let marker = Marker::new(beat_index, marker_type, label);
        let id = marker.id.clone();
        self.markers.push(marker);
        self.sort_markers();
        self.touch();

        let pos = self.markers.iter().position(|m| m.id == id).unwrap_or(0);
        &self.markers[pos]
    }

    /// Change a marker in place and restore ordering
    pub fn update_marker(
        &mut self,
        id: &str,
        beat_index: u64,
        marker_type: MarkerType,
        label: Option<String>,
    ) -> Result<()> {
        let marker = self
            .markers
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| EightcountError::MarkerNotFound {
                song_id: self.song_id.clone(),
                id: id.to_string(),
            })?;

        marker.beat_index = beat_index;
        marker.marker_type = marker_type;
        marker.label = label.filter(|l| !l.trim().is_empty());

        self.sort_markers();
        self.touch();
        Ok(())
    }

    pub fn remove_marker(&mut self, id: &str) -> Result<Marker> {
        let pos = self
            .markers
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| EightcountError::MarkerNotFound {
                song_id: self.song_id.clone(),
                id: id.to_string(),
            })?;
        self.touch();
        Ok(self.markers.remove(pos))
    }

    /// Section markers in beat order
    pub fn section_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.marker_type == MarkerType::Section)
    }

    /// Repair data read from storage or an import so the engine's
    /// preconditions hold.
    ///
    /// Returns true if anything was changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();

        if !(0.0..=MAX_BPM).contains(&self.bpm) {
            self.bpm = 0.0;
        }

        self.count_changes
            .retain(|c| (1..=COUNTS_PER_CYCLE).contains(&c.reset_to));

        // Last write wins on a shared beat: keep the latest entry for each beat
        let mut deduped: Vec<CountChange> = Vec::with_capacity(self.count_changes.len());
        for change in self.count_changes.drain(..) {
            match deduped.iter_mut().find(|c| c.beat_index == change.beat_index) {
                Some(existing) => *existing = change,
                None => deduped.push(change),
            }
        }
        self.count_changes = deduped;

        self.sort_count_changes();
        self.sort_markers();

        *self != before
    }

    /// Record a modification
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn sort_count_changes(&mut self) {
        self.count_changes.sort_by_key(|c| c.beat_index);
    }

    // Stable sort: markers on the same beat keep insertion order
    fn sort_markers(&mut self) {
        self.markers.sort_by_key(|m| m.beat_index);
    }

    fn count_change_by_id(&self, id: &str) -> Result<&CountChange> {
        self.count_changes
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| self.count_change_not_found(id))
    }

    fn count_change_not_found(&self, id: &str) -> EightcountError {
        EightcountError::CountChangeNotFound {
            song_id: self.song_id.clone(),
            id: id.to_string(),
        }
    }
}

/// Fresh unique identifier for songs, markers and count changes
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
