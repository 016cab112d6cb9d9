/// Default model file looked up in the model cache directory.
pub const YOLO_MODEL_NAME: &str = "yolov8n.onnx";

/// Detector confidence threshold used when none is configured.
pub const DEFAULT_CONFIDENCE: f64 = 0.3;

/// Max frames a person track can be lost before removal (~1 second at 30 fps).
pub const TRACKER_MAX_LOST: usize = 30;

pub const PERSON_LABEL: &str = "person";

pub const FURNITURE_LABELS: &[&str] = &["chair", "dining table", "table"];

/// Accumulated contact time needed for a video track to count as sitting.
pub const SITTING_SECONDS: f64 = 2.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

/// Class names of the 80-class COCO label set, in model output order.
pub const COCO_LABELS: &[&str] = &[
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];
