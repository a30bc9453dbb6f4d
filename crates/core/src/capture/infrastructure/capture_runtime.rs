use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::stream_geometry::StreamGeometry;
use crate::shared::channel::ChannelSet;

use super::recorded_source::RecordedFrameSource;
use super::synthetic_source::SyntheticFrameSource;

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Process-wide capture driver state.
///
/// At most one runtime is alive at a time. Frame sources borrow it, so
/// they are always closed before the runtime shuts down.
#[derive(Debug)]
pub struct CaptureRuntime {
    registered: bool,
}

impl CaptureRuntime {
    pub fn initialize() -> Result<Self, CaptureError> {
        ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CaptureError::RuntimeActive)?;
        log::debug!("Capture runtime initialized");
        Ok(Self { registered: true })
    }

    /// Runtime that skips the process-wide registration, so tests can run
    /// in parallel.
    #[cfg(test)]
    pub(crate) fn unregistered() -> Self {
        Self { registered: false }
    }

    /// Source that replays a capture directory.
    pub fn recorded(&self, root: &Path, channels: ChannelSet, fps: f64) -> RecordedFrameSource<'_> {
        RecordedFrameSource::new(self, root, channels, fps)
    }

    /// Source that generates test patterns.
    pub fn synthetic(
        &self,
        geometry: StreamGeometry,
        channels: ChannelSet,
        fps: f64,
    ) -> SyntheticFrameSource<'_> {
        SyntheticFrameSource::new(self, geometry, channels, fps)
    }
}

impl Drop for CaptureRuntime {
    fn drop(&mut self) {
        if self.registered {
            ACTIVE.store(false, Ordering::Release);
            log::debug!("Capture runtime shut down");
        }
    }
}
