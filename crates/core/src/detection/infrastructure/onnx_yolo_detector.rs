/// YOLOv8-family object detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, class decoding, per-class NMS,
/// and ByteTrack id assignment for person detections.
use std::collections::BTreeMap;
use std::path::Path;

use crate::detection::domain::detection::{Detection, DetectionResult};
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::bbox::BoundingBox;
use crate::shared::frame::Frame;

use super::bytetrack_tracker::{ByteTracker, TrackerInput};
use super::math::nms;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Leading box values per candidate row: cx, cy, w, h.
const BOX_VALUES: usize = 4;

/// Object detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    labels: Vec<String>,
    person_label: String,
    tracker: ByteTracker,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model whose class order matches `labels`. Boxes
    /// labelled `person_label` (case-insensitive) are handed to `tracker`.
    ///
    /// The input resolution is read from the model's NCHW input shape and
    /// falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(
        model_path: &Path,
        labels: Vec<String>,
        person_label: &str,
        tracker: ByteTracker,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { ref shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::debug!(
            "Loaded {} ({} classes, input {input_size}px)",
            model_path.display(),
            labels.len()
        );

        Ok(Self {
            session,
            labels,
            person_label: person_label.to_string(),
            tracker,
            confidence,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<DetectionResult>, Box<dyn std::error::Error>> {
        let Some(candidates) = self.infer(frame)? else {
            return Ok(None);
        };
        let kept = per_class_nms(candidates, NMS_IOU_THRESH);
        Ok(Some(label_detections(
            &kept,
            &self.labels,
            &self.person_label,
            &mut self.tracker,
        )))
    }
}

impl OnnxYoloDetector {
    /// Runs the model and decodes every candidate above the confidence
    /// threshold into frame coordinates. `None` when the model yields no outputs.
    fn infer(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<Vec<Candidate>>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Ok(None);
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // [1, features, candidates] is the usual export; [1, candidates, features] also occurs.
        let transposed = shape[1] < shape[2];
        let (num_candidates, num_features) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_features <= BOX_VALUES {
            return Err(format!("YOLO output has no class scores: {shape:?}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let value = |cand: usize, feat: usize| -> f64 {
            let idx = if transposed {
                feat * num_candidates + cand
            } else {
                cand * num_features + feat
            };
            data[idx] as f64
        };

        let mut candidates = Vec::new();
        for i in 0..num_candidates {
            let Some((class_id, score)) = (BOX_VALUES..num_features)
                .map(|f| (f - BOX_VALUES, value(i, f)))
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            else {
                continue;
            };
            if score < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (value(i, 0), value(i, 1), value(i, 2), value(i, 3));
            candidates.push(Candidate {
                class_id,
                score,
                bbox: [
                    (cx - w / 2.0 - pad_x as f64) / scale,
                    (cy - h / 2.0 - pad_y as f64) / scale,
                    (cx + w / 2.0 - pad_x as f64) / scale,
                    (cy + h / 2.0 - pad_y as f64) / scale,
                ],
            });
        }

        Ok(Some(candidates))
    }
}

/// Maps kept candidates to labelled detections and assigns track ids to the
/// ones labelled `person_label`. Candidates with an unknown class id are dropped.
fn label_detections(
    kept: &[Candidate],
    labels: &[String],
    person_label: &str,
    tracker: &mut ByteTracker,
) -> DetectionResult {
    let mut detections = Vec::with_capacity(kept.len());
    let mut person_slots = Vec::new();
    let mut person_inputs = Vec::new();

    for cand in kept {
        let Some(label) = labels.get(cand.class_id) else {
            log::debug!("Dropping detection with unknown class id {}", cand.class_id);
            continue;
        };
        if label.eq_ignore_ascii_case(person_label) {
            person_slots.push(detections.len());
            person_inputs.push(TrackerInput {
                bbox: cand.bbox,
                score: cand.score,
            });
        }
        let [x1, y1, x2, y2] = cand.bbox;
        detections.push(Detection::new(
            label.clone(),
            BoundingBox::from_f64(x1, y1, x2, y2),
            None,
        ));
    }

    for assignment in tracker.update(&person_inputs) {
        detections[person_slots[assignment.det_index]].track_id = Some(assignment.track_id);
    }

    DetectionResult::new(detections)
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // 114 gray padding, YOLO convention
    let gray = 114.0f32 / 255.0;
    let side = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, side, side), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Candidate {
    class_id: usize,
    score: f64,
    bbox: [f64; 4],
}

/// Runs NMS independently for each class so a person box never suppresses
/// the chair it overlaps. Output is grouped by ascending class id, highest
/// score first within a class.
fn per_class_nms(candidates: Vec<Candidate>, iou_thresh: f64) -> Vec<Candidate> {
    let mut by_class: BTreeMap<usize, Vec<Candidate>> = BTreeMap::new();
    for cand in candidates {
        by_class.entry(cand.class_id).or_default().push(cand);
    }

    let mut kept = Vec::new();
    for group in by_class.into_values() {
        let boxes: Vec<[f64; 4]> = group.iter().map(|c| c.bbox).collect();
        let scores: Vec<f64> = group.iter().map(|c| c.score).collect();
        for i in nms(&boxes, &scores, iou_thresh) {
            kept.push(group[i].clone());
        }
    }
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
