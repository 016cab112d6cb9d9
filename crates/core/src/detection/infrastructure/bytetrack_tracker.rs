/// Simplified ByteTrack tracker for person detections.
///
/// High-confidence detections are associated with existing tracks first, then
/// low-confidence detections may keep unmatched tracks alive. An unmatched
/// input opens a new track only when it scores at least the new-track
/// threshold; anything weaker is reported without an id.
use std::collections::HashSet;

use super::math::bbox_iou;

/// A candidate box handed to the tracker, `[x1, y1, x2, y2]` in frame pixels.
#[derive(Clone, Debug)]
pub struct TrackerInput {
    pub bbox: [f64; 4],
    pub score: f64,
}

/// Binds the input at `det_index` to the persistent `track_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackAssignment {
    pub det_index: usize,
    pub track_id: u32,
}

const HIGH_THRESH: f64 = 0.5;
const MATCH_THRESH: f64 = 0.3;

#[derive(Clone, Debug)]
struct TrackState {
    id: u32,
    bbox: [f64; 4],
    frames_lost: usize,
    det_index: Option<usize>,
}

pub struct ByteTracker {
    tracks: Vec<TrackState>,
    next_id: u32,
    max_lost: usize,
    new_track_thresh: f64,
}

impl ByteTracker {
    pub fn new(max_lost: usize) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            max_lost,
            new_track_thresh: HIGH_THRESH,
        }
    }

    /// Minimum score for an unmatched input to open a track. Set this to the
    /// detector confidence so every reported person can be tracked.
    pub fn with_new_track_thresh(mut self, thresh: f64) -> Self {
        self.new_track_thresh = thresh;
        self
    }

    /// Associates this frame's inputs with tracks; returns one assignment per
    /// input that received an id, ordered by `det_index`.
    pub fn update(&mut self, inputs: &[TrackerInput]) -> Vec<TrackAssignment> {
        let (high, low): (Vec<usize>, Vec<usize>) =
            (0..inputs.len()).partition(|&i| inputs[i].score >= HIGH_THRESH);

        for track in &mut self.tracks {
            track.det_index = None;
        }
        let existing = self.tracks.len();

        let all_tracks: Vec<usize> = (0..existing).collect();
        let used_high = self.associate(&all_tracks, &high, inputs);

        let unmatched: Vec<usize> = (0..existing)
            .filter(|&t| self.tracks[t].det_index.is_none())
            .collect();
        let used_low = self.associate(&unmatched, &low, inputs);

        let births: Vec<usize> = (0..inputs.len())
            .filter(|di| !used_high.contains(di) && !used_low.contains(di))
            .filter(|&di| inputs[di].score >= self.new_track_thresh)
            .collect();
        for di in births {
            self.tracks.push(TrackState {
                id: self.next_id,
                bbox: inputs[di].bbox,
                frames_lost: 0,
                det_index: Some(di),
            });
            self.next_id += 1;
        }

        for track in self.tracks.iter_mut().take(existing) {
            if track.det_index.is_none() {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks.retain(|t| t.frames_lost <= max_lost);

        let mut assignments: Vec<TrackAssignment> = self
            .tracks
            .iter()
            .filter_map(|t| {
                t.det_index.map(|det_index| TrackAssignment {
                    det_index,
                    track_id: t.id,
                })
            })
            .collect();
        assignments.sort_by_key(|a| a.det_index);
        assignments
    }

    /// Greedy IoU matching of `candidates` against `track_indices`, highest
    /// IoU first. Returns the input indices that were consumed.
    fn associate(
        &mut self,
        track_indices: &[usize],
        candidates: &[usize],
        inputs: &[TrackerInput],
    ) -> HashSet<usize> {
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for &ti in track_indices {
            for &di in candidates {
                let score = bbox_iou(&self.tracks[ti].bbox, &inputs[di].bbox);
                if score >= MATCH_THRESH {
                    pairs.push((ti, di, score));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

        let mut used_tracks = HashSet::new();
        let mut used_dets = HashSet::new();
        for (ti, di, _) in pairs {
            if used_tracks.contains(&ti) || used_dets.contains(&di) {
                continue;
            }
            used_tracks.insert(ti);
            used_dets.insert(di);
            let track = &mut self.tracks[ti];
            track.bbox = inputs[di].bbox;
            track.frames_lost = 0;
            track.det_index = Some(di);
        }
        used_dets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> TrackerInput {
        TrackerInput {
            bbox: [x1, y1, x2, y2],
            score,
        }
    }

    fn id_of(assignments: &[TrackAssignment], det_index: usize) -> Option<u32> {
        assignments
            .iter()
            .find(|a| a.det_index == det_index)
            .map(|a| a.track_id)
    }

    #[test]
    fn test_new_inputs_get_distinct_ids() {
        let mut tracker = ByteTracker::new(5);
        let out = tracker.update(&[
            input(0.0, 0.0, 50.0, 100.0, 0.9),
            input(200.0, 0.0, 250.0, 100.0, 0.8),
        ]);
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].track_id, out[1].track_id);
    }

    #[test]
    fn test_id_is_stable_across_frames() {
        let mut tracker = ByteTracker::new(5);
        let first = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.9)]);
        let id = first[0].track_id;

        let second = tracker.update(&[input(13.0, 12.0, 63.0, 162.0, 0.9)]);
        assert_eq!(id_of(&second, 0), Some(id));
    }

    #[test]
    fn test_assignments_follow_input_order() {
        let mut tracker = ByteTracker::new(5);
        let first = tracker.update(&[
            input(0.0, 0.0, 50.0, 100.0, 0.9),
            input(300.0, 0.0, 350.0, 100.0, 0.9),
        ]);
        let (a, b) = (first[0].track_id, first[1].track_id);

        // Same people, listed in the opposite order
        let second = tracker.update(&[
            input(301.0, 0.0, 351.0, 100.0, 0.9),
            input(1.0, 0.0, 51.0, 100.0, 0.9),
        ]);
        assert_eq!(id_of(&second, 0), Some(b));
        assert_eq!(id_of(&second, 1), Some(a));
    }

    #[test]
    fn test_lost_track_is_dropped_after_max_lost() {
        let mut tracker = ByteTracker::new(1);
        let first = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.9)]);
        let id = first[0].track_id;

        tracker.update(&[]);
        tracker.update(&[]);
        let back = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.9)]);
        assert_ne!(id_of(&back, 0), Some(id));
    }

    #[test]
    fn test_track_survives_short_gap() {
        let mut tracker = ByteTracker::new(3);
        let first = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.9)]);
        let id = first[0].track_id;

        tracker.update(&[]);
        tracker.update(&[]);
        let back = tracker.update(&[input(12.0, 10.0, 62.0, 160.0, 0.9)]);
        assert_eq!(id_of(&back, 0), Some(id));
    }

    #[test]
    fn test_low_confidence_keeps_existing_track() {
        let mut tracker = ByteTracker::new(5);
        let first = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.9)]);
        let id = first[0].track_id;

        let second = tracker.update(&[input(12.0, 12.0, 62.0, 162.0, 0.35)]);
        assert_eq!(id_of(&second, 0), Some(id));
    }

    #[test]
    fn test_low_confidence_does_not_open_track() {
        let mut tracker = ByteTracker::new(5);
        assert!(tracker
            .update(&[input(10.0, 10.0, 60.0, 160.0, 0.35)])
            .is_empty());
    }

    #[test]
    fn test_new_track_thresh_lets_weak_input_open_track() {
        let mut tracker = ByteTracker::new(5).with_new_track_thresh(0.3);
        let out = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.35)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].det_index, 0);
    }

    #[test]
    fn test_new_track_thresh_still_rejects_below() {
        let mut tracker = ByteTracker::new(5).with_new_track_thresh(0.3);
        assert!(tracker
            .update(&[input(10.0, 10.0, 60.0, 160.0, 0.25)])
            .is_empty());
    }

    #[test]
    fn test_weak_input_matching_track_is_not_duplicated() {
        let mut tracker = ByteTracker::new(5).with_new_track_thresh(0.3);
        let first = tracker.update(&[input(10.0, 10.0, 60.0, 160.0, 0.9)]);
        let id = first[0].track_id;

        let second = tracker.update(&[input(11.0, 10.0, 61.0, 160.0, 0.35)]);
        assert_eq!(second, vec![TrackAssignment { det_index: 0, track_id: id }]);
    }

    #[test]
    fn test_empty_frame() {
        let mut tracker = ByteTracker::new(5);
        assert!(tracker.update(&[]).is_empty());
    }
}
