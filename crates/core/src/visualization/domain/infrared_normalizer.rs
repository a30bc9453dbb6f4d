use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::constants::DEFAULT_IR_FULL_SCALE;
use crate::shared::frame::{Frame, PixelFormat, SampleFrame};

use super::depth_colorizer::check_geometry;
use super::render_error::RenderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfraredScale {
    /// Sample value that maps to white.
    pub full_scale: u16,
}

impl Default for InfraredScale {
    fn default() -> Self {
        Self {
            full_scale: DEFAULT_IR_FULL_SCALE,
        }
    }
}

/// Linear 16-bit to 8-bit gray conversion, saturating at `full_scale`.
pub fn normalize_sample(sample: u16, scale: &InfraredScale) -> u8 {
    if scale.full_scale == 0 {
        return 0;
    }
    (sample as u32 * 255 / scale.full_scale as u32).min(255) as u8
}

/// Writes an 8-bit gray image for an infrared frame.
pub fn normalize_frame(
    ir: &SampleFrame,
    out: &mut Frame,
    scale: &InfraredScale,
) -> Result<(), RenderError> {
    check_geometry(ir, out, PixelFormat::Gray8)?;
    out.set_index(ir.index());
    out.data_mut()
        .par_iter_mut()
        .zip(ir.data().par_iter())
        .for_each(|(gray, &sample)| *gray = normalize_sample(sample, scale));
    Ok(())
}
