use std::path::Path;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::sitting::domain::sitting_engine::SittingEngine;
use crate::sitting::domain::verdict::ImageVerdict;
use crate::video::domain::video_reader::VideoReader;

/// Single-image pipeline: read → close → detect → classify.
pub struct EvaluateImageUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn ObjectDetector>,
    engine: SittingEngine,
}

impl EvaluateImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn ObjectDetector>,
        engine: SittingEngine,
    ) -> Self {
        Self {
            reader,
            detector,
            engine,
        }
    }

    pub fn execute(&mut self, input_path: &Path) -> Result<ImageVerdict, Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input_path)?;
        let first = self.reader.frames().next();
        self.reader.close();
        let frame = first.ok_or("No frames in image")??;

        log::debug!(
            "Evaluating image {} ({}x{})",
            input_path.display(),
            metadata.width,
            metadata.height
        );
        let result = self.detector.detect(&frame)?;
        Ok(self.engine.evaluate_image(result.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection::{Detection, DetectionResult};
    use crate::shared::bbox::BoundingBox;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::sitting::domain::sitting_config::SittingConfig;
    use crate::sitting::error::SittingError;
    use std::sync::{Arc, Mutex};

    // ── Stubs ──

    struct StubImageReader {
        frame: Option<Frame>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubImageReader {
        fn new(frame: Option<Frame>) -> Self {
            Self {
                frame,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubImageReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata::still(8, 8, None))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frame.take().into_iter().map(Ok))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubDetector {
        result: Option<DetectionResult>,
        reader_closed: Arc<Mutex<bool>>,
        closed_at_detect: Arc<Mutex<Option<bool>>>,
    }

    impl ObjectDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Option<DetectionResult>, Box<dyn std::error::Error>> {
            *self.closed_at_detect.lock().unwrap() = Some(*self.reader_closed.lock().unwrap());
            Ok(self.result.clone())
        }
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 0)
    }

    fn engine() -> SittingEngine {
        SittingEngine::new(&SittingConfig::default()).unwrap()
    }

    fn build(
        frame: Option<Frame>,
        result: Option<DetectionResult>,
    ) -> (EvaluateImageUseCase, Arc<Mutex<Option<bool>>>) {
        let reader = StubImageReader::new(frame);
        let closed_at_detect = Arc::new(Mutex::new(None));
        let detector = StubDetector {
            result,
            reader_closed: reader.closed.clone(),
            closed_at_detect: closed_at_detect.clone(),
        };
        let use_case = EvaluateImageUseCase::new(Box::new(reader), Box::new(detector), engine());
        (use_case, closed_at_detect)
    }

    // ── Tests ──

    #[test]
    fn test_counts_people_on_furniture() {
        let result = DetectionResult::new(vec![
            Detection::new("person", BoundingBox::new(30, 10, 70, 100), Some(1)),
            Detection::new("person", BoundingBox::new(300, 10, 340, 100), Some(2)),
            Detection::new("chair", BoundingBox::new(0, 0, 100, 120), None),
        ]);
        let (mut use_case, _) = build(Some(frame()), Some(result));

        let verdict = use_case.execute(Path::new("room.jpg")).unwrap();
        assert_eq!(verdict.unique_people_sitting, 1);
        assert_eq!(verdict.sitting_ids, vec![1]);
        assert_eq!(verdict.annotations.len(), 1);
    }

    #[test]
    fn test_empty_detections_yield_zero() {
        let (mut use_case, _) = build(Some(frame()), Some(DetectionResult::default()));
        let verdict = use_case.execute(Path::new("room.jpg")).unwrap();
        assert_eq!(verdict.unique_people_sitting, 0);
    }

    #[test]
    fn test_missing_result_is_an_error() {
        let (mut use_case, _) = build(Some(frame()), None);
        let err = use_case.execute(Path::new("room.jpg")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SittingError>(),
            Some(&SittingError::NoDetections)
        );
    }

    #[test]
    fn test_missing_frame_is_an_error() {
        let (mut use_case, closed_at_detect) = build(None, Some(DetectionResult::default()));
        assert!(use_case.execute(Path::new("room.jpg")).is_err());
        assert!(closed_at_detect.lock().unwrap().is_none());
    }

    #[test]
    fn test_reader_closed_before_detection() {
        let (mut use_case, closed_at_detect) = build(Some(frame()), Some(DetectionResult::default()));
        use_case.execute(Path::new("room.jpg")).unwrap();
        assert_eq!(*closed_at_detect.lock().unwrap(), Some(true));
    }
}
