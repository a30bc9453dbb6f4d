use thiserror::Error;

use crate::shared::channel::SensorChannel;

use super::stream_geometry::StreamGeometry;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no capture device found: {0}")]
    NoDevice(String),
    #[error("{channel} channel unavailable: {reason}")]
    ChannelUnavailable {
        channel: SensorChannel,
        reason: String,
    },
    #[error("no sensor channels enabled")]
    NoChannelsEnabled,
    #[error("{channel} stream is {actual} but the session negotiated {expected}")]
    ResolutionMismatch {
        channel: SensorChannel,
        expected: StreamGeometry,
        actual: StreamGeometry,
    },
    #[error("{0} channel is not open")]
    NotOpen(SensorChannel),
    #[error("failed to read {channel} frame {index}: {reason}")]
    Read {
        channel: SensorChannel,
        index: usize,
        reason: String,
    },
    #[error("capture runtime is already initialized in this process")]
    RuntimeActive,
}
