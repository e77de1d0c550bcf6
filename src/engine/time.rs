//! Time ↔ beat conversion
//!
//! `bpm <= 0` means no tempo is configured. Every function has a defined
//! answer for that case instead of failing.

use crate::types::BeatPosition;

/// Milliseconds per beat, or 0 when no tempo is configured
pub fn beat_interval_ms(bpm: f64) -> f64 {
    if bpm > 0.0 {
        60_000.0 / bpm
    } else {
        0.0
    }
}

/// Wall-clock position of a beat
///
/// Exact linear mapping with no rounding. Negative and out-of-range indices
/// are valid; callers clamp as needed.
pub fn beat_to_ms(beat_index: i64, bpm: f64, first_beat_ms: u64) -> f64 {
    first_beat_ms as f64 + beat_index as f64 * beat_interval_ms(bpm)
}

/// Beat containing a wall-clock position (floored)
///
/// `NoBeat` when no tempo is configured or `ms` precedes the first beat.
pub fn ms_to_beat(ms: u64, bpm: f64, first_beat_ms: u64) -> BeatPosition {
    let interval = beat_interval_ms(bpm);
    if interval <= 0.0 || ms < first_beat_ms {
        return BeatPosition::NoBeat;
    }
    BeatPosition::Beat(((ms - first_beat_ms) as f64 / interval).floor() as u64)
}

/// Beat closest to a wall-clock position
///
/// Unlike [`ms_to_beat`] this never reports "no beat": it snaps to beat 0
/// when there is no tempo or `ms` precedes the first beat, so a user action
/// can always be attached somewhere.
pub fn nearest_beat(ms: u64, bpm: f64, first_beat_ms: u64) -> u64 {
    let interval = beat_interval_ms(bpm);
    if interval <= 0.0 || ms < first_beat_ms {
        return 0;
    }
    ((ms - first_beat_ms) as f64 / interval).round() as u64
}

/// Number of whole beats between the first beat and the end of the song
pub fn total_beats(duration_ms: u64, bpm: f64, first_beat_ms: u64) -> u64 {
    let interval = beat_interval_ms(bpm);
    if interval <= 0.0 || duration_ms <= first_beat_ms {
        return 0;
    }
    ((duration_ms - first_beat_ms) as f64 / interval).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_interval() {
        assert_eq!(beat_interval_ms(120.0), 500.0);
        assert_eq!(beat_interval_ms(128.0), 468.75);
        assert_eq!(beat_interval_ms(0.0), 0.0);
        assert_eq!(beat_interval_ms(-90.0), 0.0);
        assert_eq!(beat_interval_ms(f64::NAN), 0.0);
    }

    #[test]
    fn test_scenario_120_bpm_with_offset() {
        assert_eq!(ms_to_beat(1000, 120.0, 1000), BeatPosition::Beat(0));
        assert_eq!(ms_to_beat(1499, 120.0, 1000), BeatPosition::Beat(0));
        assert_eq!(ms_to_beat(1500, 120.0, 1000), BeatPosition::Beat(1));
        assert_eq!(ms_to_beat(999, 120.0, 1000), BeatPosition::NoBeat);
        assert_eq!(beat_to_ms(4, 120.0, 1000), 3000.0);
    }

    #[test]
    fn test_beat_to_ms_negative_index() {
        assert_eq!(beat_to_ms(-2, 120.0, 1000), 0.0);
        assert_eq!(beat_to_ms(-4, 120.0, 1000), -1000.0);
    }

    #[test]
    fn test_round_trip() {
        for &bpm in &[60.0, 96.0, 100.0, 120.0, 125.0, 128.0, 150.0] {
            for &first in &[0u64, 250, 1000, 12_345] {
                for beat in 0..2000i64 {
                    let ms = beat_to_ms(beat, bpm, first).ceil() as u64;
                    assert_eq!(
                        ms_to_beat(ms, bpm, first),
                        BeatPosition::Beat(beat as u64),
                        "bpm={} first={} beat={}",
                        bpm,
                        first,
                        beat
                    );
                }
            }
        }
    }

    #[test]
    fn test_beat_to_ms_strictly_increasing() {
        for &bpm in &[1.0, 87.5, 120.0, 300.0] {
            let mut prev = beat_to_ms(-10, bpm, 500);
            for beat in -9..500 {
                let ms = beat_to_ms(beat, bpm, 500);
                assert!(ms > prev, "bpm={} beat={}", bpm, beat);
                prev = ms;
            }
        }
    }

    #[test]
    fn test_nearest_beat_rounds() {
        // 500ms beats from 1000ms
        assert_eq!(nearest_beat(1240, 120.0, 1000), 0);
        assert_eq!(nearest_beat(1250, 120.0, 1000), 1);
        assert_eq!(nearest_beat(1760, 120.0, 1000), 2);
    }

    #[test]
    fn test_nearest_beat_never_undefined() {
        // Asymmetric with ms_to_beat: before the first beat snaps to 0
        assert_eq!(nearest_beat(200, 120.0, 1000), 0);
        assert_eq!(ms_to_beat(200, 120.0, 1000), BeatPosition::NoBeat);
    }

    #[test]
    fn test_total_beats() {
        assert_eq!(total_beats(41_000, 120.0, 1000), 80);
        assert_eq!(total_beats(41_499, 120.0, 1000), 80);
        assert_eq!(total_beats(1000, 120.0, 1000), 0);
        assert_eq!(total_beats(500, 120.0, 1000), 0);
    }

    #[test]
    fn test_disabled_tempo() {
        assert_eq!(total_beats(180_000, 0.0, 0), 0);
        assert_eq!(ms_to_beat(5000, 0.0, 0), BeatPosition::NoBeat);
        assert_eq!(nearest_beat(5000, 0.0, 0), 0);
        assert_eq!(beat_to_ms(10, 0.0, 750), 750.0);
    }
}
