//! Landmark regression on square face crops.
//!
//! One component serves every point layout: the variant fixes the number of
//! points read back, the model file fixes everything else. Models take a
//! `1×3×S×S` RGB tensor in `[0,1]` and emit `2N` coordinates normalized to
//! the crop.
use std::path::Path;

use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::detection::domain::landmark_variant::LandmarkVariant;
use crate::shared::detection_box::DetectionBox;
use crate::shared::frame::Frame;
use crate::shared::landmark_set::LandmarkSet;

use super::execution_provider::load_session;

pub struct OnnxLandmarkRegressor {
    session: ort::session::Session,
    variant: LandmarkVariant,
    margin: f64,
}

impl OnnxLandmarkRegressor {
    pub fn new(
        model_path: &Path,
        variant: LandmarkVariant,
        margin: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::info!("Landmark model: {variant} from {}", model_path.display());
        Ok(Self {
            session,
            variant,
            margin,
        })
    }

    fn fit_one(&mut self, frame: &Frame, face: &DetectionBox) -> Result<LandmarkSet, Box<dyn std::error::Error>> {
        let crop = face.square_around(self.margin);
        let tensor = crop_tensor(frame, &crop, self.variant.input_size());

        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let coords = outputs[0].try_extract_array::<f32>()?;
        let coords = coords.as_slice().ok_or("Cannot get landmark slice")?;

        let points = map_points(coords, &crop, self.variant.point_count())
            .map_err(|e| format!("{} model {e}", self.variant))?;
        Ok(LandmarkSet::new(*face, points))
    }
}

impl LandmarkDetector for OnnxLandmarkRegressor {
    fn locate(
        &mut self,
        frame: &Frame,
        faces: &[DetectionBox],
    ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>> {
        let mut sets = Vec::with_capacity(faces.len());
        for face in faces.iter().filter(|f| !f.is_empty()) {
            sets.push(self.fit_one(frame, face)?);
        }
        Ok(sets)
    }
}

/// Samples `crop` into a `size × size` RGB tensor; pixels outside the frame
/// are black.
fn crop_tensor(frame: &Frame, crop: &DetectionBox, size: u32) -> ndarray::Array4<f32> {
    let s = size as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);
    let step_x = crop.width as f64 / s as f64;
    let step_y = crop.height as f64 / s as f64;

    for y in 0..s {
        let src_y = crop.y as i64 + ((y as f64 + 0.5) * step_y) as i64;
        if src_y < 0 || src_y >= fh {
            continue;
        }
        for x in 0..s {
            let src_x = crop.x as i64 + ((x as f64 + 0.5) * step_x) as i64;
            if src_x < 0 || src_x >= fw {
                continue;
            }
            let rgb = frame.rgb_at(src_x as u32, src_y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = rgb[c] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Maps `count` normalized `(x, y)` pairs from crop space to frame space.
///
/// Fails when the model returned fewer values than the layout needs or any
/// of them is not finite.
fn map_points(coords: &[f32], crop: &DetectionBox, count: usize) -> Result<Vec<(f32, f32)>, String> {
    if coords.len() < count * 2 {
        return Err(format!("returned {} values, expected {}", coords.len(), count * 2));
    }
    let coords = &coords[..count * 2];
    if let Some(bad) = coords.iter().position(|v| !v.is_finite()) {
        return Err(format!("returned non-finite value {} at index {bad}", coords[bad]));
    }
    Ok(coords
        .chunks_exact(2)
        .map(|p| {
            (
                crop.x as f32 + p[0] * crop.width as f32,
                crop.y as f32 + p[1] * crop.height as f32,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;
    use approx::assert_relative_eq;

    #[test]
    fn test_map_points_into_frame_space() {
        let crop = DetectionBox::new(100, 50, 200, 200, 1.0);
        let coords = [0.0, 0.0, 0.5, 0.25, 1.0, 1.0];
        let points = map_points(&coords, &crop, 3).unwrap();
        assert_eq!(points, vec![(100.0, 50.0), (200.0, 100.0), (300.0, 250.0)]);
    }

    #[test]
    fn test_map_points_ignores_extra_values() {
        let crop = DetectionBox::new(0, 0, 10, 10, 1.0);
        let coords = [0.1; 14];
        assert_eq!(map_points(&coords, &crop, 5).unwrap().len(), 5);
    }

    #[test]
    fn test_map_points_rejects_short_output() {
        let crop = DetectionBox::new(0, 0, 10, 10, 1.0);
        assert!(map_points(&[0.5; 9], &crop, 5).is_err());
    }

    #[test]
    fn test_map_points_rejects_non_finite_values() {
        let crop = DetectionBox::new(0, 0, 10, 10, 1.0);
        let mut coords = [0.5f32; 10];
        coords[3] = f32::NAN;
        let err = map_points(&coords, &crop, 5).unwrap_err();
        assert!(err.contains("index 3"));

        coords[3] = f32::INFINITY;
        assert!(map_points(&coords, &crop, 5).is_err());
    }

    #[test]
    fn test_map_points_ignores_non_finite_padding() {
        let crop = DetectionBox::new(0, 0, 10, 10, 1.0);
        let mut coords = [0.5f32; 12];
        coords[11] = f32::NAN;
        assert_eq!(map_points(&coords, &crop, 5).unwrap().len(), 5);
    }

    #[test]
    fn test_crop_tensor_shape_and_values() {
        let frame = Frame::new(vec![255u8; 20 * 20 * 3], 20, 20, PixelFormat::Rgb8, 0);
        let crop = DetectionBox::new(5, 5, 10, 10, 1.0);
        let tensor = crop_tensor(&frame, &crop, 112);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
        assert_relative_eq!(tensor[[0, 1, 56, 56]], 1.0);
    }

    #[test]
    fn test_crop_tensor_outside_frame_is_black() {
        let frame = Frame::new(vec![255u8; 10 * 10 * 3], 10, 10, PixelFormat::Rgb8, 0);
        // left half of the crop hangs off the frame
        let crop = DetectionBox::new(-10, 0, 20, 10, 1.0);
        let tensor = crop_tensor(&frame, &crop, 20);
        assert_relative_eq!(tensor[[0, 0, 5, 2]], 0.0);
        assert_relative_eq!(tensor[[0, 0, 5, 15]], 1.0);
    }
}
