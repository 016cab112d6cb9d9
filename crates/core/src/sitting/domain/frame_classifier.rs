use std::collections::{BTreeMap, BTreeSet};

use crate::detection::domain::detection::Detection;
use crate::shared::bbox::{BoundingBox, Point};
use crate::sitting::domain::sitting_config::SittingConfig;

/// A tracked person reduced to what the contact test needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonAnchor {
    pub track_id: u32,
    /// Bottom-center of the person box.
    pub anchor_point: Point,
    /// Top-left of the person box; only used for overlays.
    pub origin: Point,
}

impl PersonAnchor {
    fn from_bbox(track_id: u32, bbox: &BoundingBox) -> Self {
        Self {
            track_id,
            anchor_point: bbox.bottom_center(),
            origin: bbox.top_left(),
        }
    }

    /// Overlay box spanning origin to anchor, mirrored around the anchor's x.
    pub fn overlay_bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin.x,
            self.origin.y,
            (i64::from(self.anchor_point.x) * 2 - i64::from(self.origin.x))
                .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            self.anchor_point.y,
        )
    }
}

/// A sittable object in one frame. Has no identity across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FurnitureRegion {
    pub bbox: BoundingBox,
}

/// Per-frame classification output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameResult {
    /// Track ids whose anchor fell inside some furniture region.
    pub contacts: BTreeSet<u32>,
    /// For each contact, the index into `furniture` of the region that accepted it.
    pub accepted: BTreeMap<u32, usize>,
    pub persons: Vec<PersonAnchor>,
    pub furniture: Vec<FurnitureRegion>,
    /// Detections dropped as malformed (bad box, person without track id).
    pub skipped: usize,
}

/// Splits a frame's detections into person anchors and furniture regions and
/// decides which persons are in contact with furniture.
#[derive(Clone, Debug)]
pub struct FrameClassifier {
    person_label: String,
    furniture_labels: Vec<String>,
}

impl FrameClassifier {
    pub fn new(config: &SittingConfig) -> Self {
        Self {
            person_label: config.person_label.clone(),
            furniture_labels: config.furniture_labels.clone(),
        }
    }

    pub fn is_furniture(&self, detection: &Detection) -> bool {
        self.furniture_labels.iter().any(|l| detection.has_label(l))
    }

    pub fn classify(&self, detections: &[Detection]) -> FrameResult {
        let mut result = FrameResult::default();

        for det in detections {
            let is_person = det.has_label(&self.person_label);
            if !is_person && !self.is_furniture(det) {
                continue;
            }
            if !det.bbox.is_well_formed() {
                log::debug!("Skipping '{}' with malformed box {:?}", det.class_label, det.bbox);
                result.skipped += 1;
                continue;
            }
            if is_person {
                match det.track_id {
                    Some(tid) => result.persons.push(PersonAnchor::from_bbox(tid, &det.bbox)),
                    None => {
                        log::debug!("Skipping untracked person at {:?}", det.bbox);
                        result.skipped += 1;
                    }
                }
            } else {
                result.furniture.push(FurnitureRegion { bbox: det.bbox });
            }
        }

        // First furniture region in detection order wins; no overlap ranking.
        for person in &result.persons {
            let hit = result
                .furniture
                .iter()
                .position(|f| f.bbox.contains(person.anchor_point));
            if let Some(index) = hit {
                result.contacts.insert(person.track_id);
                result.accepted.entry(person.track_id).or_insert(index);
            }
        }

        result
    }
}
