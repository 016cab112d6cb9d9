use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::frame::Frame;
use crate::sitting::domain::sitting_engine::SittingEngine;
use crate::sitting::domain::verdict::{Annotation, VideoVerdict};
use crate::video::domain::video_reader::VideoReader;

use super::pipeline_logger::PipelineLogger;

/// Receives each frame with the overlays a renderer should draw on it.
pub type FrameCallback = Box<dyn FnMut(&Frame, &[Annotation]) + Send>;

/// Sequential video pipeline: decode → detect → aggregate, one frame at a time.
///
/// The contact counters live in a fresh run per `execute`, so the use case
/// can be executed again on another file.
pub struct EvaluateVideoUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn ObjectDetector>,
    engine: SittingEngine,
    logger: Box<dyn PipelineLogger>,
    on_frame: Option<FrameCallback>,
    cancelled: Arc<AtomicBool>,
}

/// Closes the reader when dropped, whichever way `execute` returns.
struct ReaderGuard<'a> {
    reader: &'a mut Box<dyn VideoReader>,
}

impl Drop for ReaderGuard<'_> {
    fn drop(&mut self) {
        self.reader.close();
    }
}

impl EvaluateVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn ObjectDetector>,
        engine: SittingEngine,
        logger: Box<dyn PipelineLogger>,
        on_frame: Option<FrameCallback>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader,
            detector,
            engine,
            logger,
            on_frame,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(&mut self, input_path: &Path) -> Result<VideoVerdict, Box<dyn std::error::Error>> {
        let Self {
            reader,
            detector,
            engine,
            logger,
            on_frame,
            cancelled,
        } = self;

        let metadata = reader.open(input_path)?;
        let mut guard = ReaderGuard { reader };
        logger.info(&format!(
            "Evaluating {} ({}x{}, {:.2} fps, {} frames)",
            input_path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        ));

        let mut run = engine.start_video(metadata.fps);
        let mut processed = 0;

        for item in guard.reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                logger.info("Evaluation cancelled");
                return Err("Cancelled".into());
            }
            let frame = item?;

            let started = Instant::now();
            let result = detector.detect(&frame)?;
            logger.timing("detect", elapsed_ms(started));

            let started = Instant::now();
            let overlays = run.observe(result.as_ref());
            logger.timing("aggregate", elapsed_ms(started));

            if let Some(result) = &result {
                logger.metric("detections", result.detections.len() as f64);
            }
            if let Some(callback) = on_frame.as_mut() {
                callback(&frame, &overlays);
            }

            processed += 1;
            logger.progress(processed, metadata.total_frames);
        }

        let verdict = run.finish();
        logger.summary();
        Ok(verdict)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
