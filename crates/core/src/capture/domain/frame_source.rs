use crate::shared::frame::{Frame, SampleFrame};

use super::capture_error::CaptureError;
use super::stream_geometry::{ChannelProfile, StreamGeometry};

/// A three-channel camera: color, depth and infrared.
///
/// Reads block until the channel's next frame is available and write into
/// the caller's buffer, which must match the negotiated geometry. There is
/// no timeout and no queueing beyond the source's own buffering.
pub trait FrameSource: Send {
    /// Starts every enabled channel and returns their common resolution.
    fn open(&mut self) -> Result<StreamGeometry, CaptureError>;

    /// Profiles negotiated by the last successful [`open`](Self::open).
    fn profiles(&self) -> &[ChannelProfile];

    fn next_color(&mut self, frame: &mut Frame) -> Result<(), CaptureError>;

    fn next_depth(&mut self, frame: &mut SampleFrame) -> Result<(), CaptureError>;

    fn next_ir(&mut self, frame: &mut SampleFrame) -> Result<(), CaptureError>;

    /// Releases all channel resources. Idempotent, and safe after a failed
    /// or partial open.
    fn close(&mut self);
}
