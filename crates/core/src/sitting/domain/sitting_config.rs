use serde::{Deserialize, Serialize};

use crate::shared::constants::{FURNITURE_LABELS, PERSON_LABEL, SITTING_SECONDS};
use crate::sitting::error::SittingError;

/// Which labels the engine treats as people and as sittable furniture, and
/// how long a video track must be in contact to count as sitting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SittingConfig {
    pub person_label: String,
    pub furniture_labels: Vec<String>,
    pub sitting_seconds: f64,
}

impl Default for SittingConfig {
    fn default() -> Self {
        Self {
            person_label: PERSON_LABEL.to_string(),
            furniture_labels: FURNITURE_LABELS.iter().map(|s| s.to_string()).collect(),
            sitting_seconds: SITTING_SECONDS,
        }
    }
}

impl SittingConfig {
    pub fn validate(&self) -> Result<(), SittingError> {
        if !self.sitting_seconds.is_finite() || self.sitting_seconds < 0.0 {
            return Err(SittingError::InvalidConfig(format!(
                "sitting_seconds must be a non-negative number, got {}",
                self.sitting_seconds
            )));
        }
        if self.person_label.trim().is_empty() {
            return Err(SittingError::InvalidConfig(
                "person_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contact frames required for `seconds` of video at `fps`: `round(fps * seconds)`.
///
/// A zero, negative, or non-finite rate yields 0, so any track with a single
/// contact frame qualifies. Callers surface that case as a diagnostic.
pub fn threshold_frames(fps: f64, seconds: f64) -> u64 {
    let frames = fps * seconds;
    if !frames.is_finite() || frames <= 0.0 {
        return 0;
    }
    frames.round() as u64
}
