pub mod bytetrack_tracker;
pub mod math;
pub mod onnx_yolo_detector;
