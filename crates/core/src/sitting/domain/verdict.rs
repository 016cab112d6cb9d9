use serde::Serialize;

use crate::shared::bbox::BoundingBox;

/// A box a renderer should draw for one person track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub track_id: u32,
    pub bbox: BoundingBox,
}

/// Conditions that do not stop an evaluation but change what its result means.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The stream reported a zero, negative, or unreadable frame rate, so the
    /// threshold collapsed to zero frames.
    CorruptFps { fps: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageVerdict {
    pub unique_people_sitting: usize,
    pub sitting_ids: Vec<u32>,
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VideoVerdict {
    pub unique_people_sitting: usize,
    pub sitting_ids: Vec<u32>,
    /// Last overlay seen for each sitting track.
    pub annotations: Vec<Annotation>,
    pub fps: f64,
    pub threshold_frames: u64,
    pub frames_processed: usize,
    /// Frames where the detector returned no result at all.
    pub frames_without_result: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_serializes_with_kind_tag() {
        let json = serde_json::to_value(Diagnostic::CorruptFps { fps: 0.0 }).unwrap();
        assert_eq!(json["kind"], "corrupt_fps");
        assert_eq!(json["fps"], 0.0);
    }

    #[test]
    fn test_image_verdict_field_names() {
        let verdict = ImageVerdict {
            unique_people_sitting: 1,
            sitting_ids: vec![3],
            annotations: vec![Annotation {
                track_id: 3,
                bbox: BoundingBox::new(1, 2, 3, 4),
            }],
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["unique_people_sitting"], 1);
        assert_eq!(json["annotations"][0]["bbox"]["x2"], 3);
    }
}
