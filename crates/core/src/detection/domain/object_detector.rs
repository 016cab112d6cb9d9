use crate::detection::domain::detection::DetectionResult;
use crate::shared::frame::Frame;

/// Domain interface for object detection with person tracking.
///
/// `Ok(None)` means the detector produced no result structure for the
/// frame, which callers must not confuse with an empty detection list.
/// Implementations are stateful (the tracker persists across frames),
/// hence `&mut self`.
pub trait ObjectDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<DetectionResult>, Box<dyn std::error::Error>>;
}
