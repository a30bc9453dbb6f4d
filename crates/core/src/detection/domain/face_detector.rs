use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::shared::detection_box::DetectionBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations keep no per-frame state; `&mut self` is for the
/// inference session.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionBox>, Box<dyn std::error::Error>>;
}

/// Which detection network to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    #[default]
    Yunet,
    Blazeface,
}

impl DetectorKind {
    /// Score threshold used when none is configured.
    pub fn default_confidence(self) -> f32 {
        match self {
            DetectorKind::Yunet => 0.9,
            DetectorKind::Blazeface => 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub kind: DetectorKind,
    /// Explicit model file; resolved from the model cache when unset.
    pub model_path: Option<PathBuf>,
    /// Minimum detection score; the kind's default when unset.
    pub confidence: Option<f32>,
    /// Overlap above which the weaker of two boxes is dropped.
    pub nms_threshold: f64,
    /// Candidates kept before suppression.
    pub top_k: usize,
    /// Resize factor applied before inference; boxes are mapped back.
    pub input_scale: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            kind: DetectorKind::default(),
            model_path: None,
            confidence: None,
            nms_threshold: 0.3,
            top_k: 5000,
            input_scale: 1.0,
        }
    }
}

impl DetectorSettings {
    pub fn effective_confidence(&self) -> f32 {
        self.confidence
            .unwrap_or_else(|| self.kind.default_confidence())
    }
}
