use std::collections::{HashMap, HashSet};

use crate::detection::domain::detection::DetectionResult;
use crate::sitting::domain::contact_state::ContactState;
use crate::sitting::domain::frame_classifier::{FrameClassifier, PersonAnchor};
use crate::sitting::domain::sitting_config::{threshold_frames, SittingConfig};
use crate::sitting::domain::verdict::{Annotation, Diagnostic, ImageVerdict, VideoVerdict};
use crate::sitting::error::SittingError;

/// Shared entry point for image and video evaluation.
///
/// Both modes run the same [`FrameClassifier`]; they differ only in how
/// per-frame contacts become a verdict.
#[derive(Clone, Debug)]
pub struct SittingEngine {
    classifier: FrameClassifier,
    sitting_seconds: f64,
}

impl SittingEngine {
    pub fn new(config: &SittingConfig) -> Result<Self, SittingError> {
        config.validate()?;
        Ok(Self {
            classifier: FrameClassifier::new(config),
            sitting_seconds: config.sitting_seconds,
        })
    }

    /// Single-frame verdict: every track in contact is sitting.
    ///
    /// `None` means the detector produced no result structure and is an
    /// error, unlike an empty detection list which yields a zero count.
    pub fn evaluate_image(
        &self,
        result: Option<&DetectionResult>,
    ) -> Result<ImageVerdict, SittingError> {
        let result = result.ok_or(SittingError::NoDetections)?;
        let frame = self.classifier.classify(&result.detections);

        let annotations = overlays(&frame.persons, |tid| frame.contacts.contains(&tid));

        Ok(ImageVerdict {
            unique_people_sitting: frame.contacts.len(),
            sitting_ids: frame.contacts.into_iter().collect(),
            annotations,
        })
    }

    /// Begins a video evaluation. Frames must then be observed in decode order.
    pub fn start_video(&self, fps: f64) -> VideoRun<'_> {
        let mut diagnostics = Vec::new();
        if !(fps.is_finite() && fps > 0.0) {
            log::warn!(
                "Stream reports fps = {fps}; sitting threshold drops to 0 frames and any contact counts"
            );
            diagnostics.push(Diagnostic::CorruptFps { fps });
        }
        VideoRun {
            classifier: &self.classifier,
            state: ContactState::new(),
            fps,
            threshold_frames: threshold_frames(fps, self.sitting_seconds),
            frames_processed: 0,
            frames_without_result: 0,
            last_overlay: HashMap::new(),
            diagnostics,
        }
    }

    /// Evaluates a whole frame sequence, `None` entries being frames the
    /// detector returned nothing for.
    pub fn evaluate_video<'a, I>(&self, frames: I, fps: f64) -> VideoVerdict
    where
        I: IntoIterator<Item = Option<&'a DetectionResult>>,
    {
        let mut run = self.start_video(fps);
        for result in frames {
            run.observe(result);
        }
        run.finish()
    }
}

/// One overlay per selected track id. A track listed twice in a frame keeps
/// its first box.
fn overlays(persons: &[PersonAnchor], selected: impl Fn(u32) -> bool) -> Vec<Annotation> {
    let mut seen = HashSet::new();
    persons
        .iter()
        .filter(|p| selected(p.track_id) && seen.insert(p.track_id))
        .map(|p| Annotation {
            track_id: p.track_id,
            bbox: p.overlay_bbox(),
        })
        .collect()
}

/// State of one in-progress video evaluation.
///
/// Owns its [`ContactState`], so concurrent evaluations never share counters.
pub struct VideoRun<'a> {
    classifier: &'a FrameClassifier,
    state: ContactState,
    fps: f64,
    threshold_frames: u64,
    frames_processed: usize,
    frames_without_result: usize,
    last_overlay: HashMap<u32, Annotation>,
    diagnostics: Vec<Diagnostic>,
}

impl VideoRun<'_> {
    /// Classifies and aggregates the next frame.
    ///
    /// Returns the overlays for this frame: every visible person that has
    /// been in contact at least once so far in the run.
    pub fn observe(&mut self, result: Option<&DetectionResult>) -> Vec<Annotation> {
        self.frames_processed += 1;
        let Some(result) = result else {
            self.frames_without_result += 1;
            return Vec::new();
        };

        let frame = self.classifier.classify(&result.detections);
        self.state.update(&frame);

        let state = &self.state;
        let drawn = overlays(&frame.persons, |tid| state.has_contact(tid));
        for overlay in &drawn {
            self.last_overlay.insert(overlay.track_id, *overlay);
        }
        drawn
    }

    pub fn threshold_frames(&self) -> u64 {
        self.threshold_frames
    }

    pub fn contact_state(&self) -> &ContactState {
        &self.state
    }

    pub fn finish(self) -> VideoVerdict {
        let sitting = self.state.finalize(self.threshold_frames);
        let annotations = sitting
            .iter()
            .filter_map(|tid| self.last_overlay.get(tid).copied())
            .collect();

        log::info!(
            "{} of {} contacted tracks sitting (threshold {} frames, {} frames)",
            sitting.len(),
            self.state.tracks(),
            self.threshold_frames,
            self.frames_processed
        );

        VideoVerdict {
            unique_people_sitting: sitting.len(),
            sitting_ids: sitting.into_iter().collect(),
            annotations,
            fps: self.fps,
            threshold_frames: self.threshold_frames,
            frames_processed: self.frames_processed,
            frames_without_result: self.frames_without_result,
            diagnostics: self.diagnostics,
        }
    }
}
