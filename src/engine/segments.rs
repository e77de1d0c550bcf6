//! Structure segmentation
//!
//! Splits the song's beats into blocks for display: either user-declared
//! sections or, when there are none, plain eights.

use crate::types::{Marker, MarkerType, StructureSegment};

/// Width of the default "eights" blocks
pub const DEFAULT_SEGMENT_BEATS: u64 = 8;

/// Partition `[0, total_beats)` into ordered, contiguous segments
///
/// Any section marker inside the song switches from eights to sections. Each
/// section runs until the next section marker or the end of the song, and
/// sections sharing a beat collapse to empty spans that are dropped. Beats
/// before the first section form an unlabeled leading segment.
pub fn structure_segments(total_beats: u64, markers: &[Marker]) -> Vec<StructureSegment> {
    let mut sections: Vec<&Marker> = markers
        .iter()
        .filter(|m| m.marker_type == MarkerType::Section && m.beat_index < total_beats)
        .collect();
    sections.sort_by_key(|m| m.beat_index);

    if sections.is_empty() {
        return eights(total_beats);
    }

    let mut segments = Vec::with_capacity(sections.len() + 1);

    let first_start = sections[0].beat_index;
    if first_start > 0 {
        segments.push(StructureSegment {
            start_beat: 0,
            end_beat: first_start,
            label: None,
        });
    }

    for (i, marker) in sections.iter().enumerate() {
        let end_beat = sections
            .get(i + 1)
            .map(|next| next.beat_index)
            .unwrap_or(total_beats);

        if end_beat > marker.beat_index {
            segments.push(StructureSegment {
                start_beat: marker.beat_index,
                end_beat,
                label: marker.label.clone(),
            });
        }
    }

    segments
}

fn eights(total_beats: u64) -> Vec<StructureSegment> {
    (0..total_beats)
        .step_by(DEFAULT_SEGMENT_BEATS as usize)
        .map(|start_beat| StructureSegment {
            start_beat,
            end_beat: (start_beat + DEFAULT_SEGMENT_BEATS).min(total_beats),
            label: None,
        })
        .collect()
}

/// Index of the segment containing `beat`
pub fn segment_index_for_beat(segments: &[StructureSegment], beat: u64) -> Option<usize> {
    let idx = segments.partition_point(|s| s.end_beat <= beat);
    segments.get(idx).filter(|s| s.contains(beat)).map(|_| idx)
}
