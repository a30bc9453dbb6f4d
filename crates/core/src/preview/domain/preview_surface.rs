use std::time::Duration;

use crate::shared::frame::Frame;

/// Where preview frames are shown and keys are read.
///
/// Windows are created on first use of their name. Not `Send`: GUI
/// toolkits generally require the thread that created the window.
pub trait PreviewSurface {
    /// Shows `frame` in the window called `window`.
    fn present(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `timeout` for a key press. Doubles as the event pump.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<i32>, Box<dyn std::error::Error>>;

    /// False once the user has closed the preview.
    fn is_open(&self) -> bool;

    fn close(&mut self);
}
