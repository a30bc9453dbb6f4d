use super::detection_box::DetectionBox;

/// Ordered facial landmark points for one detected face.
///
/// Point count and meaning are fixed by the model that produced them
/// (5-point: eyes, nose tip, mouth corners; 68-point: iBUG 300-W layout).
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    face: DetectionBox,
    points: Vec<(f32, f32)>,
}

impl LandmarkSet {
    pub fn new(face: DetectionBox, points: Vec<(f32, f32)>) -> Self {
        Self { face, points }
    }

    /// The detection this set was fitted inside.
    pub fn face(&self) -> &DetectionBox {
        &self.face
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Detections and landmarks belonging to a single frame.
///
/// Reset at the start of every loop iteration so nothing outlives the
/// frame that produced it.
#[derive(Clone, Debug, Default)]
pub struct FrameAnnotations {
    frame_index: usize,
    faces: Vec<DetectionBox>,
    landmarks: Vec<LandmarkSet>,
}

impl FrameAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything from the previous frame and binds to `frame_index`.
    pub fn reset(&mut self, frame_index: usize) {
        self.frame_index = frame_index;
        self.faces.clear();
        self.landmarks.clear();
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn set_faces(&mut self, faces: Vec<DetectionBox>) {
        self.faces = faces;
    }

    pub fn set_landmarks(&mut self, landmarks: Vec<LandmarkSet>) {
        self.landmarks = landmarks;
    }

    pub fn faces(&self) -> &[DetectionBox] {
        &self.faces
    }

    pub fn landmarks(&self) -> &[LandmarkSet] {
        &self.landmarks
    }
}
