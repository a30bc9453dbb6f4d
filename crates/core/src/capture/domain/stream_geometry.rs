use std::fmt;

use crate::shared::channel::SensorChannel;

use super::capture_error::CaptureError;

/// Width and height shared by every enabled channel of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamGeometry {
    pub width: u32,
    pub height: u32,
}

impl StreamGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for StreamGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sample layout a channel delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleLayout {
    Rgb888,
    /// 16-bit distance, sensor-native units.
    Depth16,
    Gray16,
}

/// Capture mode negotiated for one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelProfile {
    pub channel: SensorChannel,
    pub geometry: StreamGeometry,
    pub fps: f64,
    pub layout: SampleLayout,
}

impl ChannelProfile {
    pub fn new(channel: SensorChannel, geometry: StreamGeometry, fps: f64) -> Self {
        let layout = match channel {
            SensorChannel::Color => SampleLayout::Rgb888,
            SensorChannel::Depth => SampleLayout::Depth16,
            SensorChannel::Infrared => SampleLayout::Gray16,
        };
        Self {
            channel,
            geometry,
            fps,
            layout,
        }
    }
}

impl fmt::Display for ChannelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} @ {:.0} fps ({:?})",
            self.channel, self.geometry, self.fps, self.layout
        )
    }
}

/// Checks that all profiles agree on one resolution and returns it.
///
/// The first profile sets the expectation; an empty list means nothing was
/// enabled.
pub fn negotiate(profiles: &[ChannelProfile]) -> Result<StreamGeometry, CaptureError> {
    let first = profiles.first().ok_or(CaptureError::NoChannelsEnabled)?;
    let expected = first.geometry;
    for profile in &profiles[1..] {
        if profile.geometry != expected {
            return Err(CaptureError::ResolutionMismatch {
                channel: profile.channel,
                expected,
                actual: profile.geometry,
            });
        }
    }
    Ok(expected)
}
