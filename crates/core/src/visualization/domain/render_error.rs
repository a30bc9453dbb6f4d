use thiserror::Error;

use crate::shared::frame::PixelFormat;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("output is {out_w}x{out_h} but samples are {in_w}x{in_h}")]
    GeometryMismatch {
        in_w: u32,
        in_h: u32,
        out_w: u32,
        out_h: u32,
    },
    #[error("output frame must be {expected:?}, got {actual:?}")]
    WrongFormat {
        expected: PixelFormat,
        actual: PixelFormat,
    },
}
