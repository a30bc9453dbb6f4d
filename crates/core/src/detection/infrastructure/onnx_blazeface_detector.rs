/// BlazeFace face detector using ONNX Runtime via `ort`.
///
/// A compact detector that provides bounding boxes only. Suitable as a fast
/// alternative when YuNet is unavailable.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectorSettings, FaceDetector};
use crate::shared::detection_box::DetectionBox;
use crate::shared::frame::Frame;

use super::execution_provider::load_session;
use super::nms::{nms, RawDetection};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output: box deltas + 6 keypoints.
const REGRESSOR_STRIDE: usize = 16;

/// BlazeFace face detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    confidence: f32,
    nms_threshold: f64,
    top_k: usize,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, settings: &DetectorSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            confidence: settings.effective_confidence(),
            nms_threshold: settings.nms_threshold,
            top_k: settings.top_k,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionBox>, Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();

        // 1. Preprocess: resize to 128x128, normalize to [0,1], NCHW
        let input_tensor = preprocess(frame, INPUT_SIZE);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // BlazeFace outputs two tensors:
        // - regressors: [1, 896, 16] (box deltas + keypoints)
        // - classificators: [1, 896, 1] (confidence scores)
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        // 3. Decode anchor boxes + filter by confidence
        let raw_dets = decode(&self.anchors, reg_data, score_data, self.confidence, fw, fh);

        // 4. NMS
        let kept = nms(raw_dets, self.nms_threshold, self.top_k);
        log::trace!("BlazeFace: {} faces in frame {}", kept.len(), frame.index());

        Ok(kept
            .iter()
            .map(|d| d.to_box(fw, fh))
            .filter(|b| !b.is_empty())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32, RGB.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src_h = frame.height();
    let src_w = frame.width();
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as u32).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as u32).min(src_w - 1);
            let rgb = frame.rgb_at(src_x, src_y);
            for c in 0..3 {
                tensor[[0, c, y, x]] = rgb[c] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Anchors and decoding (BlazeFace short-range)
// ---------------------------------------------------------------------------

/// Generate BlazeFace anchors for the short-range model.
///
/// The short-range model uses two feature map sizes: 16×16 and 8×8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Turns raw scores and regressor rows into frame-space candidates.
fn decode(
    anchors: &[[f32; 2]],
    reg_data: &[f32],
    score_data: &[f32],
    confidence: f32,
    fw: u32,
    fh: u32,
) -> Vec<RawDetection> {
    let mut dets = Vec::new();
    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score);
        if score < confidence {
            continue;
        }

        let reg_offset = i * REGRESSOR_STRIDE;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        // Decode box center + size relative to anchor
        let anchor = &anchors[i];
        let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

        dets.push(RawDetection {
            x1: ((cx - w / 2.0) * fw as f32) as f64,
            y1: ((cy - h / 2.0) * fh as f32) as f64,
            x2: ((cx + w / 2.0) * fw as f32) as f64,
            y2: ((cy + h / 2.0) * fh as f32) as f64,
            score: score as f64,
        });
    }
    dets
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
