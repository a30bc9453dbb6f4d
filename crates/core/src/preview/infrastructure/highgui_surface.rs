use std::collections::HashSet;
use std::time::Duration;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::{highgui, imgproc};

use crate::preview::domain::preview_surface::PreviewSurface;
use crate::shared::frame::{Frame, PixelFormat};

/// OpenCV highgui windows.
///
/// Must be used from the thread that created it.
#[derive(Debug, Default)]
pub struct HighguiSurface {
    windows: HashSet<String>,
    closed: bool,
}

impl HighguiSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewSurface for HighguiSurface {
    fn present(&mut self, window: &str, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.windows.insert(window.to_string()) {
            highgui::named_window_def(window)?;
        }

        let flat = Mat::from_slice(frame.data())?;
        let mat = flat.reshape(frame.channels() as i32, frame.height() as i32)?;
        match frame.format() {
            PixelFormat::Rgb8 => {
                let mut bgr = Mat::default();
                imgproc::cvt_color_def(&*mat, &mut bgr, imgproc::COLOR_RGB2BGR)?;
                highgui::imshow(window, &bgr)?;
            }
            PixelFormat::Bgr8 | PixelFormat::Gray8 => highgui::imshow(window, &*mat)?,
        }
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<i32>, Box<dyn std::error::Error>> {
        let delay = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        let key = highgui::wait_key(delay)?;
        Ok((key >= 0).then_some(key & 0xFF))
    }

    fn is_open(&self) -> bool {
        if self.closed {
            return false;
        }
        // A window the user closed reports itself invisible
        self.windows.iter().all(|name| {
            highgui::get_window_property(name, highgui::WND_PROP_VISIBLE)
                .map(|visible| visible >= 1.0)
                .unwrap_or(false)
        })
    }

    fn close(&mut self) {
        if !self.closed && !self.windows.is_empty() {
            if let Err(e) = highgui::destroy_all_windows() {
                log::warn!("Failed to destroy preview windows: {e}");
            }
        }
        self.windows.clear();
        self.closed = true;
    }
}
