use std::collections::{BTreeSet, HashMap};

use crate::sitting::domain::frame_classifier::FrameResult;

/// Per-track contact-frame counters for one video evaluation.
///
/// Counters only grow: a frame without contact leaves a track untouched, so
/// a person who sits, stands, and sits again keeps accumulating. What is
/// compared against the threshold is the total number of contact frames,
/// not the longest contiguous streak.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactState {
    counts: HashMap<u32, u64>,
}

impl ContactState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one contact frame for every track in `frame.contacts`.
    pub fn update(&mut self, frame: &FrameResult) {
        for &tid in &frame.contacts {
            *self.counts.entry(tid).or_insert(0) += 1;
        }
    }

    /// Contact frames accumulated so far; 0 for unseen tracks.
    pub fn count(&self, track_id: u32) -> u64 {
        self.counts.get(&track_id).copied().unwrap_or(0)
    }

    /// True once the track has had at least one contact frame.
    pub fn has_contact(&self, track_id: u32) -> bool {
        self.counts.contains_key(&track_id)
    }

    pub fn tracks(&self) -> usize {
        self.counts.len()
    }

    /// Tracks whose accumulated count reached `threshold_frames`.
    pub fn finalize(&self, threshold_frames: u64) -> BTreeSet<u32> {
        self.counts
            .iter()
            .filter(|(_, &count)| count >= threshold_frames)
            .map(|(&tid, _)| tid)
            .collect()
    }
}
