use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crate::preview::domain::preview_surface::PreviewSurface;
use crate::shared::frame::Frame;

/// Surface with no display: counts presentations and never sees a key.
///
/// Pair with a frame budget, or the loop only ends when the process is
/// interrupted.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    presented: HashMap<String, usize>,
    closed: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-window presentation counts, sorted by window name.
    fn summary(&self) -> String {
        let mut windows: Vec<_> = self.presented.iter().collect();
        windows.sort();
        windows
            .iter()
            .map(|(window, count)| format!("{window}: {count}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl PreviewSurface for HeadlessSurface {
    fn present(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let count = self.presented.entry(window.to_string()).or_default();
        *count += 1;
        log::trace!(
            "{window}: frame {} ({}x{} {:?})",
            frame.index(),
            frame.width(),
            frame.height(),
            frame.format()
        );
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        thread::sleep(timeout);
        Ok(None)
    }

    fn is_open(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) {
        if !self.closed {
            log::debug!("Headless preview closed ({})", self.summary());
        }
        self.closed = true;
    }
}
