//! Eight-count derivation
//!
//! The count of a beat is never stored. It is recomputed from the beat index
//! and the sparse list of count changes every time it is needed.

use crate::engine::time::ms_to_beat;
use crate::types::{CountChange, COUNTS_PER_CYCLE};

/// Count (1-8) of a beat
///
/// Uses the last count change at or before `beat_index`. `count_changes`
/// must be sorted by beat: the scan stops at the first change past the beat.
/// With no applicable change, counting runs naturally from beat 0.
pub fn count_for_beat(beat_index: u64, count_changes: &[CountChange]) -> u8 {
    let cycle = u64::from(COUNTS_PER_CYCLE);

    let mut relevant: Option<&CountChange> = None;
    for change in count_changes {
        if change.beat_index <= beat_index {
            relevant = Some(change);
        } else {
            break;
        }
    }

    match relevant {
        Some(change) => {
            let beats_since = beat_index - change.beat_index;
            // rem_euclid keeps a malformed reset_to of 0 in range
            let start = (i64::from(change.reset_to) - 1).rem_euclid(cycle as i64) as u64;
            ((start + beats_since % cycle) % cycle + 1) as u8
        }
        None => (beat_index % cycle + 1) as u8,
    }
}

/// Counts for beats `0..total_beats`
pub fn generate_counts(total_beats: u64, count_changes: &[CountChange]) -> Vec<u8> {
    (0..total_beats)
        .map(|beat| count_for_beat(beat, count_changes))
        .collect()
}

/// Count at a wall-clock position, `None` when there is no beat there
pub fn count_at_ms(ms: u64, bpm: f64, first_beat_ms: u64, count_changes: &[CountChange]) -> Option<u8> {
    ms_to_beat(ms, bpm, first_beat_ms)
        .index()
        .map(|beat| count_for_beat(beat, count_changes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset(beat_index: u64, reset_to: u8) -> CountChange {
        CountChange {
            id: format!("reset-{}", beat_index),
            beat_index,
            reset_to,
        }
    }

    #[test]
    fn test_natural_count_cycle() {
        for beat in 0..10_000u64 {
            assert_eq!(count_for_beat(beat, &[]), (beat % 8) as u8 + 1, "beat={}", beat);
        }
        assert_eq!(count_for_beat(8, &[]), 1);
        assert_eq!(count_for_beat(15, &[]), 8);
    }

    #[test]
    fn test_reset_anchoring() {
        for k in [0u64, 3, 10, 77] {
            for r in 1..=8u8 {
                let changes = [reset(k, r)];
                assert_eq!(count_for_beat(k, &changes), r, "k={} r={}", k, r);
                assert_eq!(count_for_beat(k + 8, &changes), r, "k={} r={}", k, r);
            }
        }
    }

    #[test]
    fn test_scenario_reset_at_10() {
        let changes = [reset(10, 5)];
        assert_eq!(count_for_beat(9, &changes), 2, "Before the reset counting is natural");
        assert_eq!(count_for_beat(10, &changes), 5);
        assert_eq!(count_for_beat(11, &changes), 6);
        assert_eq!(count_for_beat(13, &changes), 8);
        assert_eq!(count_for_beat(14, &changes), 1);
        assert_eq!(count_for_beat(18, &changes), 5);
    }

    #[test]
    fn test_far_past_last_reset() {
        let changes = [reset(10, 5)];
        // 10 + 8 * 1_000_000 lands back on the anchor count
        assert_eq!(count_for_beat(10 + 8_000_000, &changes), 5);
        assert_eq!(count_for_beat(u64::MAX, &changes), count_for_beat(u64::MAX % 8 + 16, &changes));
    }

    #[test]
    fn test_multiple_resets_use_latest_applicable() {
        let changes = [reset(4, 1), reset(20, 7), reset(40, 3)];
        assert_eq!(count_for_beat(3, &changes), 4);
        assert_eq!(count_for_beat(4, &changes), 1);
        assert_eq!(count_for_beat(19, &changes), 8);
        assert_eq!(count_for_beat(20, &changes), 7);
        assert_eq!(count_for_beat(21, &changes), 8);
        assert_eq!(count_for_beat(22, &changes), 1);
        assert_eq!(count_for_beat(40, &changes), 3);
    }

    #[test]
    fn test_all_future_resets_fall_back() {
        let changes = [reset(100, 4)];
        assert_eq!(count_for_beat(0, &changes), 1);
        assert_eq!(count_for_beat(99, &changes), 4);
    }

    #[test]
    fn test_generate_counts_matches_single_lookup() {
        let changes = [reset(6, 1), reset(13, 5)];
        let counts = generate_counts(24, &changes);
        assert_eq!(counts.len(), 24);
        for (beat, count) in counts.iter().enumerate() {
            assert_eq!(*count, count_for_beat(beat as u64, &changes));
        }
        assert_eq!(&counts[..8], &[1, 2, 3, 4, 5, 6, 1, 2]);
        // Re-callable: same input, same output
        assert_eq!(counts, generate_counts(24, &changes));
        assert!(generate_counts(0, &changes).is_empty());
    }

    #[test]
    fn test_count_at_ms() {
        assert_eq!(count_at_ms(1500, 120.0, 1000, &[]), Some(2));
        assert_eq!(count_at_ms(500, 120.0, 1000, &[]), None);
        assert_eq!(count_at_ms(1500, 0.0, 0, &[]), None);
    }
}
