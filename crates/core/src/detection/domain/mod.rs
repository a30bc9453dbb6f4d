pub mod face_detector;
pub mod landmark_detector;
pub mod landmark_variant;
