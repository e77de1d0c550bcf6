//! Beat map snapshot and position tracking

use crate::engine;
use crate::types::{BeatPosition, Breakdown, CountChange, StructureSegment};
use tracing::trace;

/// Everything derived at one playback position
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPosition {
    pub position_ms: u64,
    pub beat: BeatPosition,
    /// Count 1-8, `None` when there is no beat at this position
    pub count: Option<u8>,
    /// Index into [`BeatMap::segments`]
    pub segment: Option<usize>,
}

/// Derived beat-space view of one song
///
/// Built from a breakdown snapshot. Rebuild it after every edit; it never
/// tracks the breakdown it came from.
#[derive(Debug, Clone)]
pub struct BeatMap {
    bpm: f64,
    first_beat_ms: u64,
    duration_ms: u64,
    count_changes: Vec<CountChange>,
    total_beats: u64,
    segments: Vec<StructureSegment>,
}

impl BeatMap {
    pub fn from_breakdown(breakdown: &Breakdown, duration_ms: u64) -> Self {
        let total_beats = engine::total_beats(duration_ms, breakdown.bpm, breakdown.first_beat_ms);
        let segments = engine::structure_segments(total_beats, &breakdown.markers);

        Self {
            bpm: breakdown.bpm,
            first_beat_ms: breakdown.first_beat_ms,
            duration_ms,
            count_changes: breakdown.count_changes.clone(),
            total_beats,
            segments,
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn first_beat_ms(&self) -> u64 {
        self.first_beat_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn total_beats(&self) -> u64 {
        self.total_beats
    }

    pub fn segments(&self) -> &[StructureSegment] {
        &self.segments
    }

    /// Beat, count and segment at a playback position
    pub fn position(&self, position_ms: u64) -> PlaybackPosition {
        let beat = engine::ms_to_beat(position_ms, self.bpm, self.first_beat_ms);
        let count = beat
            .index()
            .map(|b| engine::count_for_beat(b, &self.count_changes));
        let segment = beat
            .index()
            .and_then(|b| engine::segment_index_for_beat(&self.segments, b));

        PlaybackPosition {
            position_ms,
            beat,
            count,
            segment,
        }
    }

    pub fn count_for_beat(&self, beat_index: u64) -> u8 {
        engine::count_for_beat(beat_index, &self.count_changes)
    }

    /// Counts for every beat in the song
    pub fn counts(&self) -> Vec<u8> {
        engine::generate_counts(self.total_beats, &self.count_changes)
    }

    /// Beat to attach a user action at `position_ms` to
    pub fn snap(&self, position_ms: u64) -> u64 {
        engine::nearest_beat(position_ms, self.bpm, self.first_beat_ms)
    }

    pub fn beat_start_ms(&self, beat_index: u64) -> f64 {
        engine::beat_to_ms(beat_index as i64, self.bpm, self.first_beat_ms)
    }

    /// Wall-clock span `[start, end)` of a segment
    pub fn segment_span_ms(&self, segment: &StructureSegment) -> (f64, f64) {
        (
            self.beat_start_ms(segment.start_beat),
            self.beat_start_ms(segment.end_beat),
        )
    }
}

/// Feeds position ticks through a [`BeatMap`], reporting only beat changes
///
/// Ticks arrive far more often than beats; consumers only need to redraw when
/// the derived beat moves.
#[derive(Debug)]
pub struct PositionTracker {
    map: BeatMap,
    last_beat: Option<BeatPosition>,
}

impl PositionTracker {
    pub fn new(map: BeatMap) -> Self {
        Self {
            map,
            last_beat: None,
        }
    }

    pub fn map(&self) -> &BeatMap {
        &self.map
    }

    /// Swap in a rebuilt map after an edit; the next tick always reports
    pub fn reload(&mut self, map: BeatMap) {
        self.map = map;
        self.last_beat = None;
    }

    /// Process a tick. `Some` when the beat differs from the previous tick.
    pub fn tick(&mut self, position_ms: u64) -> Option<PlaybackPosition> {
        let position = self.map.position(position_ms);
        if self.last_beat == Some(position.beat) {
            return None;
        }

        trace!(
            "Beat {:?} count {:?} at {}ms",
            position.beat,
            position.count,
            position_ms
        );
        self.last_beat = Some(position.beat);
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarkerType;

    fn breakdown() -> Breakdown {
        let mut bd = Breakdown::new("song");
        bd.set_bpm(120.0).unwrap();
        bd.set_first_beat_ms(1000);
        bd.upsert_count_change(10, 5).unwrap();
        bd.add_marker(0, MarkerType::Section, Some("intro".into()));
        bd.add_marker(32, MarkerType::Section, Some("verse".into()));
        bd.add_marker(64, MarkerType::Section, None);
        bd
    }

    #[test]
    fn test_map_derivations() {
        let map = BeatMap::from_breakdown(&breakdown(), 41_000);
        assert_eq!(map.total_beats(), 80);
        assert_eq!(map.segments().len(), 3);
        assert_eq!(map.counts().len(), 80);
        assert_eq!(map.count_for_beat(18), 5);
        assert_eq!(map.segment_span_ms(&map.segments()[1]), (17_000.0, 33_000.0));
    }

    #[test]
    fn test_position() {
        let map = BeatMap::from_breakdown(&breakdown(), 41_000);

        let pos = map.position(6_200);
        assert_eq!(pos.beat, BeatPosition::Beat(10));
        assert_eq!(pos.count, Some(5));
        assert_eq!(pos.segment, Some(0));

        let pos = map.position(33_000);
        assert_eq!(pos.beat, BeatPosition::Beat(64));
        assert_eq!(pos.segment, Some(2));

        let before = map.position(400);
        assert_eq!(before.beat, BeatPosition::NoBeat);
        assert_eq!(before.count, None);
        assert_eq!(before.segment, None);
    }

    #[test]
    fn test_position_without_tempo() {
        let map = BeatMap::from_breakdown(&Breakdown::new("s"), 200_000);
        assert_eq!(map.total_beats(), 0);
        assert!(map.segments().is_empty());
        assert_eq!(map.position(5_000).count, None);
        assert_eq!(map.snap(5_000), 0);
    }

    #[test]
    fn test_tracker_reports_only_beat_changes() {
        let map = BeatMap::from_breakdown(&breakdown(), 41_000);
        let mut tracker = PositionTracker::new(map);

        // 100ms ticks from 0 to 3000ms: NoBeat, then beats 0..=3 at 1000ms+
        let reported: Vec<BeatPosition> = (0..=30)
            .filter_map(|i| tracker.tick(i * 100))
            .map(|p| p.beat)
            .collect();

        assert_eq!(
            reported,
            vec![
                BeatPosition::NoBeat,
                BeatPosition::Beat(0),
                BeatPosition::Beat(1),
                BeatPosition::Beat(2),
                BeatPosition::Beat(3),
                BeatPosition::Beat(4),
            ]
        );
    }

    #[test]
    fn test_tracker_reload_reports_again() {
        let map = BeatMap::from_breakdown(&breakdown(), 41_000);
        let mut tracker = PositionTracker::new(map.clone());
        assert!(tracker.tick(1200).is_some());
        assert!(tracker.tick(1300).is_none());

        tracker.reload(map);
        assert!(tracker.tick(1300).is_some());
    }
}
