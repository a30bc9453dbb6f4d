//! Linear color ramp over raw depth samples.
//!
//! Distances are coarsened into buckets, then blended between a near and a
//! far endpoint color. Zero returns and samples beyond the range render as
//! the black sentinel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_BUCKET_SIZE, DEFAULT_MAX_DISTANCE};
use crate::shared::frame::{Frame, PixelFormat, SampleFrame};

use super::render_error::RenderError;

/// A pixel in blue, green, red order.
pub type Bgr = [u8; 3];

/// "No reliable reading."
pub const SENTINEL: Bgr = [0, 0, 0];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthRamp {
    /// Color of the closest valid bucket.
    pub near: Bgr,
    /// Color at `max_distance`.
    pub far: Bgr,
    pub bucket_size: u16,
    /// Largest raw distance that still gets a color.
    pub max_distance: u16,
}

impl Default for DepthRamp {
    fn default() -> Self {
        Self {
            near: [0, 0, 255],
            far: [0, 0, 0],
            bucket_size: DEFAULT_BUCKET_SIZE,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl DepthRamp {
    /// Number of buckets spanning `0..=max_distance`; 0 disables the ramp.
    pub fn max_bucket(&self) -> u16 {
        if self.bucket_size == 0 {
            return 0;
        }
        self.max_distance / self.bucket_size
    }
}

/// Maps one raw distance sample to a color.
pub fn colorize_sample(sample: u16, ramp: &DepthRamp) -> Bgr {
    let max_bucket = ramp.max_bucket();
    if max_bucket == 0 || sample > ramp.max_distance {
        return SENTINEL;
    }
    let bucket = sample / ramp.bucket_size;
    if bucket == 0 {
        return SENTINEL;
    }

    let progress = (bucket as f64 / max_bucket as f64).clamp(0.0, 1.0);
    let remainder = 1.0 - progress;
    std::array::from_fn(|c| {
        // `as` truncates and saturates into 0..=255
        (ramp.far[c] as f64 * progress + ramp.near[c] as f64 * remainder) as u8
    })
}

/// Colorizes whole depth frames through a precomputed table.
pub struct DepthColorizer {
    table: Vec<Bgr>,
}

impl DepthColorizer {
    pub fn new(ramp: DepthRamp) -> Self {
        let table = (0..=u16::MAX)
            .map(|sample| colorize_sample(sample, &ramp))
            .collect();
        Self { table }
    }

    /// Writes one BGR pixel per sample into `out`.
    pub fn colorize(&self, depth: &SampleFrame, out: &mut Frame) -> Result<(), RenderError> {
        check_geometry(depth, out, PixelFormat::Bgr8)?;
        out.set_index(depth.index());
        out.data_mut()
            .par_chunks_exact_mut(3)
            .zip(depth.data().par_iter())
            .for_each(|(pixel, &sample)| pixel.copy_from_slice(&self.table[sample as usize]));
        Ok(())
    }
}

pub(crate) fn check_geometry(
    samples: &SampleFrame,
    out: &Frame,
    expected: PixelFormat,
) -> Result<(), RenderError> {
    if out.format() != expected {
        return Err(RenderError::WrongFormat {
            expected,
            actual: out.format(),
        });
    }
    if samples.width() != out.width() || samples.height() != out.height() {
        return Err(RenderError::GeometryMismatch {
            in_w: samples.width(),
            in_h: samples.height(),
            out_w: out.width(),
            out_h: out.height(),
        });
    }
    Ok(())
}
