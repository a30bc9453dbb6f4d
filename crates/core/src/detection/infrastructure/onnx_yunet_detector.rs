//! YuNet face detector using ONNX Runtime via `ort`.
//!
//! The network takes a BGR float image whose sides are multiples of 32 and
//! emits anchor-free predictions at strides 8, 16 and 32. Each cell carries
//! a class score, an objectness score and a box regressed relative to the
//! cell; the final score is the geometric mean of the two scores.
use std::path::Path;

use crate::detection::domain::face_detector::{DetectorSettings, FaceDetector};
use crate::shared::detection_box::DetectionBox;
use crate::shared::frame::Frame;

use super::execution_provider::load_session;
use super::nms::{nms, RawDetection};

/// Feature map strides, in output order.
const STRIDES: [usize; 3] = [8, 16, 32];

/// Input sides are padded up to a multiple of this.
const PAD_MULTIPLE: u32 = 32;

/// Output tensors: cls ×3, obj ×3, bbox ×3 (keypoints follow, unused).
const MIN_OUTPUTS: usize = 9;

pub struct OnnxYunetDetector {
    session: ort::session::Session,
    score_threshold: f32,
    nms_threshold: f64,
    top_k: usize,
    input_scale: f64,
}

impl OnnxYunetDetector {
    pub fn new(model_path: &Path, settings: &DetectorSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            score_threshold: settings.effective_confidence(),
            nms_threshold: settings.nms_threshold,
            top_k: settings.top_k,
            input_scale: settings.input_scale,
        })
    }
}

impl FaceDetector for OnnxYunetDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionBox>, Box<dyn std::error::Error>> {
        let fw = frame.width();
        let fh = frame.height();
        let input = InputLayout::new(fw, fh, self.input_scale);

        // 1. Preprocess: scale, pad, BGR planes in 0..255
        let input_tensor = preprocess(frame, &input);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() < MIN_OUTPUTS {
            return Err(format!(
                "YuNet model expected at least {MIN_OUTPUTS} outputs, got {}",
                outputs.len()
            )
            .into());
        }

        // 3. Decode every stride into frame coordinates
        let mut raw_dets = Vec::new();
        for (level, &stride) in STRIDES.iter().enumerate() {
            let cls = outputs[level].try_extract_array::<f32>()?;
            let obj = outputs[level + 3].try_extract_array::<f32>()?;
            let bbox = outputs[level + 6].try_extract_array::<f32>()?;
            let grid = StrideOutputs {
                cls: cls.as_slice().ok_or("Cannot get cls slice")?,
                obj: obj.as_slice().ok_or("Cannot get obj slice")?,
                bbox: bbox.as_slice().ok_or("Cannot get bbox slice")?,
            };
            raw_dets.extend(decode_stride(&grid, &input, stride, self.score_threshold));
        }

        // 4. NMS
        let kept = nms(raw_dets, self.nms_threshold, self.top_k);
        log::trace!("YuNet: {} faces in frame {}", kept.len(), frame.index());

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

/// Geometry of the network input for one frame size.
#[derive(Clone, Copy, Debug, PartialEq)]
struct InputLayout {
    scale: f64,
    /// Frame size after scaling.
    scaled_w: u32,
    scaled_h: u32,
    /// Tensor size after padding.
    padded_w: u32,
    padded_h: u32,
}

impl InputLayout {
    fn new(frame_w: u32, frame_h: u32, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let scaled_w = ((frame_w as f64 * scale).round() as u32).max(1);
        let scaled_h = ((frame_h as f64 * scale).round() as u32).max(1);
        Self {
            scale,
            scaled_w,
            scaled_h,
            padded_w: scaled_w.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE,
            padded_h: scaled_h.div_ceil(PAD_MULTIPLE) * PAD_MULTIPLE,
        }
    }
}

/// Nearest-neighbour resize into a zero-padded NCHW tensor, BGR order,
/// unnormalized.
fn preprocess(frame: &Frame, input: &InputLayout) -> ndarray::Array4<f32> {
    let pw = input.padded_w as usize;
    let ph = input.padded_h as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, ph, pw));

    let max_x = frame.width().saturating_sub(1);
    let max_y = frame.height().saturating_sub(1);
    for y in 0..input.scaled_h {
        let src_y = (((y as f64 + 0.5) / input.scale) as u32).min(max_y);
        for x in 0..input.scaled_w {
            let src_x = (((x as f64 + 0.5) / input.scale) as u32).min(max_x);
            let [r, g, b] = frame.rgb_at(src_x, src_y);
            let (y, x) = (y as usize, x as usize);
            tensor[[0, 0, y, x]] = b as f32;
            tensor[[0, 1, y, x]] = g as f32;
            tensor[[0, 2, y, x]] = r as f32;
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct StrideOutputs<'a> {
    /// One score per cell.
    cls: &'a [f32],
    /// One score per cell.
    obj: &'a [f32],
    /// Four values per cell: dx, dy, log w, log h in stride units.
    bbox: &'a [f32],
}

fn decode_stride(
    outputs: &StrideOutputs<'_>,
    input: &InputLayout,
    stride: usize,
    score_threshold: f32,
) -> Vec<RawDetection> {
    let cols = input.padded_w as usize / stride;
    let rows = input.padded_h as usize / stride;
    let cells = (cols * rows)
        .min(outputs.cls.len())
        .min(outputs.obj.len())
        .min(outputs.bbox.len() / 4);
    let s = stride as f64;

    let mut dets = Vec::new();
    for idx in 0..cells {
        let cls = outputs.cls[idx].clamp(0.0, 1.0);
        let obj = outputs.obj[idx].clamp(0.0, 1.0);
        let score = (cls * obj).sqrt();
        if score < score_threshold {
            continue;
        }

        let (row, col) = (idx / cols, idx % cols);
        let b = &outputs.bbox[idx * 4..idx * 4 + 4];
        let cx = (col as f64 + b[0] as f64) * s;
        let cy = (row as f64 + b[1] as f64) * s;
        let w = (b[2] as f64).exp() * s;
        let h = (b[3] as f64).exp() * s;

        // Undo the input scale so boxes land in frame coordinates
        dets.push(RawDetection {
            x1: (cx - w / 2.0) / input.scale,
            y1: (cy - h / 2.0) / input.scale,
            x2: (cx + w / 2.0) / input.scale,
            y2: (cy + h / 2.0) / input.scale,
            score: score as f64,
        });
    }
    dets
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(640, 480, 1.0, (640, 480))]
    #[case(641, 479, 1.0, (672, 480))]
    #[case(640, 480, 0.5, (320, 256))]
    #[case(10, 10, 1.0, (32, 32))]
    fn test_input_layout_padding(
        #[case] w: u32,
        #[case] h: u32,
        #[case] scale: f64,
        #[case] padded: (u32, u32),
    ) {
        let layout = InputLayout::new(w, h, scale);
        assert_eq!((layout.padded_w, layout.padded_h), padded);
        assert_eq!(layout.padded_w % PAD_MULTIPLE, 0);
        assert_eq!(layout.padded_h % PAD_MULTIPLE, 0);
    }

    #[test]
    fn test_invalid_scale_falls_back_to_identity() {
        let layout = InputLayout::new(100, 50, 0.0);
        assert_eq!(layout.scale, 1.0);
        assert_eq!((layout.scaled_w, layout.scaled_h), (100, 50));
    }

    #[test]
    fn test_preprocess_bgr_planes_and_padding() {
        // RGB frame: pure red
        let frame = Frame::new(vec![255, 0, 0].repeat(40 * 20), 40, 20, PixelFormat::Rgb8, 0);
        let layout = InputLayout::new(40, 20, 1.0);
        let tensor = preprocess(&frame, &layout);

        assert_eq!(tensor.shape(), &[1, 3, 32, 64]);
        assert_eq!(tensor[[0, 2, 0, 0]], 255.0); // red plane is last
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        // padding stays zero
        assert_eq!(tensor[[0, 2, 25, 50]], 0.0);
    }

    fn single_cell_outputs(cells: usize, hit: usize, score: f32) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let mut cls = vec![0.0; cells];
        let mut obj = vec![0.0; cells];
        let mut bbox = vec![0.0; cells * 4];
        cls[hit] = score;
        obj[hit] = score;
        // centered on the cell corner + half a cell, 2x2 strides wide
        bbox[hit * 4] = 0.5;
        bbox[hit * 4 + 1] = 0.5;
        bbox[hit * 4 + 2] = 2f32.ln();
        bbox[hit * 4 + 3] = 2f32.ln();
        (cls, obj, bbox)
    }

    #[test]
    fn test_decode_stride_places_box() {
        let layout = InputLayout::new(64, 64, 1.0);
        // stride 16 -> 4x4 grid; cell (row 1, col 2)
        let (cls, obj, bbox) = single_cell_outputs(16, 6, 0.95);
        let grid = StrideOutputs {
            cls: &cls,
            obj: &obj,
            bbox: &bbox,
        };

        let dets = decode_stride(&grid, &layout, 16, 0.9);

        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        // center (2.5 * 16, 1.5 * 16) = (40, 24), side 32
        assert_relative_eq!(d.x1, 24.0, epsilon = 1e-4);
        assert_relative_eq!(d.y1, 8.0, epsilon = 1e-4);
        assert_relative_eq!(d.x2, 56.0, epsilon = 1e-4);
        assert_relative_eq!(d.y2, 40.0, epsilon = 1e-4);
        assert_relative_eq!(d.score, 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_stride_maps_back_through_scale() {
        let layout = InputLayout::new(128, 128, 0.5);
        let (cls, obj, bbox) = single_cell_outputs(16, 6, 0.95);
        let grid = StrideOutputs {
            cls: &cls,
            obj: &obj,
            bbox: &bbox,
        };

        let dets = decode_stride(&grid, &layout, 16, 0.9);

        assert_relative_eq!(dets[0].x1, 48.0, epsilon = 1e-4);
        assert_relative_eq!(dets[0].x2, 112.0, epsilon = 1e-4);
    }

    #[test]
    fn test_decode_stride_score_is_geometric_mean() {
        let layout = InputLayout::new(32, 32, 1.0);
        let grid = StrideOutputs {
            cls: &[0.81],
            obj: &[1.0],
            bbox: &[0.0, 0.0, 0.0, 0.0],
        };
        let dets = decode_stride(&grid, &layout, 32, 0.5);
        assert_relative_eq!(dets[0].score, 0.9, epsilon = 1e-6);

        // below threshold after the square root
        assert!(decode_stride(&grid, &layout, 32, 0.95).is_empty());
    }

    #[test]
    fn test_decode_stride_clamps_scores() {
        let layout = InputLayout::new(32, 32, 1.0);
        let grid = StrideOutputs {
            cls: &[1.7],
            obj: &[-0.2],
            bbox: &[0.0, 0.0, 0.0, 0.0],
        };
        assert!(decode_stride(&grid, &layout, 32, 0.1).is_empty());
    }

    #[test]
    fn test_decode_stride_tolerates_short_outputs() {
        let layout = InputLayout::new(64, 64, 1.0);
        let grid = StrideOutputs {
            cls: &[1.0, 1.0],
            obj: &[1.0],
            bbox: &[0.0; 8],
        };
        assert_eq!(decode_stride(&grid, &layout, 8, 0.5).len(), 1);
    }
}
