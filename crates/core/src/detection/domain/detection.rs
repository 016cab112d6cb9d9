use serde::{Deserialize, Serialize};

use crate::shared::bbox::BoundingBox;

/// One object instance reported by a detector for a single frame.
///
/// `track_id` is set by the tracker for persons and is intended to be
/// stable across frames of one run. Other classes normally carry `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_label: String,
    pub bbox: BoundingBox,
    pub track_id: Option<u32>,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, bbox: BoundingBox, track_id: Option<u32>) -> Self {
        Self {
            class_label: class_label.into(),
            bbox,
            track_id,
        }
    }

    /// Case-insensitive label comparison.
    pub fn has_label(&self, label: &str) -> bool {
        self.class_label.eq_ignore_ascii_case(label)
    }
}

/// Everything a detector reported for one frame.
///
/// An empty `detections` list is a valid result; the absence of a result
/// altogether is expressed as `Option::None` by the detector port.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}
