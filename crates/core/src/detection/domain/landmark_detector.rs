use crate::shared::detection_box::DetectionBox;
use crate::shared::frame::Frame;
use crate::shared::landmark_set::LandmarkSet;

/// Fits facial landmarks inside boxes found on the same frame.
///
/// Returns one set per non-empty face, in input order.
pub trait LandmarkDetector: Send {
    fn locate(
        &mut self,
        frame: &Frame,
        faces: &[DetectionBox],
    ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>>;
}
