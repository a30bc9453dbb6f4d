use std::marker::PhantomData;

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::FrameSource;
use crate::capture::domain::stream_geometry::{negotiate, ChannelProfile, StreamGeometry};
use crate::shared::channel::{ChannelSet, SensorChannel};
use crate::shared::frame::{Frame, PixelFormat, SampleFrame};

use super::capture_runtime::CaptureRuntime;
use super::frame_pacer::FramePacer;

/// Width of the zero-depth band along the left edge.
const SHADOW_BAND: u32 = 8;
const BACKGROUND_DEPTH: u16 = 1400;
const NEAREST_DEPTH: u16 = 500;

/// Generated test patterns standing in for a camera.
///
/// Color is a diagonal gradient scrolling one pixel per frame. Depth is a
/// flat background with a dome drifting left to right and a band of missing
/// returns on the left edge. Infrared is a horizontal 10-bit ramp.
pub struct SyntheticFrameSource<'rt> {
    geometry: StreamGeometry,
    channels: ChannelSet,
    fps: f64,
    profiles: Vec<ChannelProfile>,
    open: bool,
    counters: [usize; 3],
    pacers: [FramePacer; 3],
    _runtime: PhantomData<&'rt CaptureRuntime>,
}

impl<'rt> SyntheticFrameSource<'rt> {
    pub(super) fn new(
        _runtime: &'rt CaptureRuntime,
        geometry: StreamGeometry,
        channels: ChannelSet,
        fps: f64,
    ) -> Self {
        Self {
            geometry,
            channels,
            fps,
            profiles: Vec::new(),
            open: false,
            counters: [0; 3],
            pacers: std::array::from_fn(|_| FramePacer::new(fps)),
            _runtime: PhantomData,
        }
    }

    /// Paces `channel`, checks the buffer and returns the frame index.
    fn tick(&mut self, channel: SensorChannel, buffer: (u32, u32)) -> Result<usize, CaptureError> {
        if !self.open || !self.channels.contains(channel) {
            return Err(CaptureError::NotOpen(channel));
        }
        let slot = channel as usize;
        self.pacers[slot].wait();
        let index = self.counters[slot];
        self.counters[slot] += 1;

        if buffer != (self.geometry.width, self.geometry.height) {
            return Err(CaptureError::Read {
                channel,
                index,
                reason: format!(
                    "buffer is {}x{}, session is {}",
                    buffer.0, buffer.1, self.geometry
                ),
            });
        }
        Ok(index)
    }
}

impl FrameSource for SyntheticFrameSource<'_> {
    fn open(&mut self) -> Result<StreamGeometry, CaptureError> {
        self.close();
        if self.geometry.width == 0 || self.geometry.height == 0 {
            return Err(CaptureError::NoDevice(format!(
                "synthetic source cannot produce {} frames",
                self.geometry
            )));
        }
        self.profiles = self
            .channels
            .iter()
            .map(|channel| ChannelProfile::new(channel, self.geometry, self.fps))
            .collect();
        let geometry = negotiate(&self.profiles)?;

        self.open = true;
        self.counters = [0; 3];
        log::info!("Opened synthetic source");
        for profile in &self.profiles {
            log::info!("  {profile}");
        }
        Ok(geometry)
    }

    fn profiles(&self) -> &[ChannelProfile] {
        &self.profiles
    }

    fn next_color(&mut self, frame: &mut Frame) -> Result<(), CaptureError> {
        let index = self.tick(SensorChannel::Color, (frame.width(), frame.height()))?;
        if frame.format() == PixelFormat::Gray8 {
            return Err(CaptureError::Read {
                channel: SensorChannel::Color,
                index,
                reason: "color frames need an RGB or BGR buffer".to_string(),
            });
        }
        paint_color(frame, index);
        frame.set_index(index);
        Ok(())
    }

    fn next_depth(&mut self, frame: &mut SampleFrame) -> Result<(), CaptureError> {
        let index = self.tick(SensorChannel::Depth, (frame.width(), frame.height()))?;
        paint_depth(frame, index);
        frame.set_index(index);
        Ok(())
    }

    fn next_ir(&mut self, frame: &mut SampleFrame) -> Result<(), CaptureError> {
        let index = self.tick(SensorChannel::Infrared, (frame.width(), frame.height()))?;
        paint_infrared(frame, index);
        frame.set_index(index);
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            log::debug!("Closing synthetic source");
        }
        self.open = false;
        self.profiles.clear();
    }
}

fn paint_color(frame: &mut Frame, index: usize) {
    let width = frame.width() as usize;
    let format = frame.format();
    let shift = index % 256;
    for (i, pixel) in frame.data_mut().chunks_exact_mut(3).enumerate() {
        let (x, y) = (i % width, i / width);
        let r = ((x + shift) % 256) as u8;
        let g = ((y + shift) % 256) as u8;
        let b = 128;
        match format {
            PixelFormat::Bgr8 => pixel.copy_from_slice(&[b, g, r]),
            _ => pixel.copy_from_slice(&[r, g, b]),
        }
    }
}

fn paint_depth(frame: &mut SampleFrame, index: usize) {
    let (width, height) = (frame.width(), frame.height());
    let radius = (width.min(height) / 4).max(1) as f64;
    let travel = width.max(1) as usize;
    let cx = (index % travel) as f64;
    let cy = height as f64 / 2.0;

    for (i, sample) in frame.data_mut().iter_mut().enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        if x < SHADOW_BAND.min(width / 4) {
            *sample = 0;
            continue;
        }
        let d = ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();
        *sample = if d < radius {
            let rise = (BACKGROUND_DEPTH - NEAREST_DEPTH) as f64 * (1.0 - d / radius);
            BACKGROUND_DEPTH - rise as u16
        } else {
            BACKGROUND_DEPTH
        };
    }
}

fn paint_infrared(frame: &mut SampleFrame, index: usize) {
    let width = frame.width().max(1) as usize;
    for (i, sample) in frame.data_mut().iter_mut().enumerate() {
        let x = (i % width + index) % width;
        *sample = (x * 1023 / width) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_source(runtime: &CaptureRuntime, w: u32, h: u32) -> SyntheticFrameSource<'_> {
        let mut source = runtime.synthetic(StreamGeometry::new(w, h), ChannelSet::all(), 0.0);
        source.open().unwrap();
        source
    }

    #[test]
    fn test_open_reports_profiles_for_enabled_channels() {
        let runtime = CaptureRuntime::unregistered();
        let channels = ChannelSet {
            color: true,
            depth: true,
            infrared: false,
        };
        let mut source = runtime.synthetic(StreamGeometry::new(64, 48), channels, 15.0);

        assert_eq!(source.open().unwrap(), StreamGeometry::new(64, 48));
        assert_eq!(source.profiles().len(), 2);
        assert!(source.profiles().iter().all(|p| p.fps == 15.0));
    }

    #[test]
    fn test_zero_size_is_no_device() {
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.synthetic(StreamGeometry::new(0, 48), ChannelSet::all(), 0.0);
        assert!(matches!(source.open(), Err(CaptureError::NoDevice(_))));
    }

    #[test]
    fn test_reads_before_open_fail() {
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.synthetic(StreamGeometry::new(8, 8), ChannelSet::all(), 0.0);
        let mut frame = Frame::blank(8, 8, PixelFormat::Bgr8);
        assert!(matches!(
            source.next_color(&mut frame),
            Err(CaptureError::NotOpen(SensorChannel::Color))
        ));
    }

    #[test]
    fn test_color_frames_are_deterministic_and_indexed() {
        let runtime = CaptureRuntime::unregistered();
        let mut a = open_source(&runtime, 16, 8);
        let mut b = open_source(&runtime, 16, 8);
        let mut fa = Frame::blank(16, 8, PixelFormat::Bgr8);
        let mut fb = Frame::blank(16, 8, PixelFormat::Bgr8);

        for expected in 0..3 {
            a.next_color(&mut fa).unwrap();
            b.next_color(&mut fb).unwrap();
            assert_eq!(fa.data(), fb.data());
            assert_eq!(fa.index(), expected);
        }
        // frame 2, pixel (3, 1): r = 5, g = 3
        assert_eq!(fa.rgb_at(3, 1), [5, 3, 128]);
    }

    #[test]
    fn test_depth_has_shadow_band_and_dome() {
        let runtime = CaptureRuntime::unregistered();
        let mut source = open_source(&runtime, 64, 48);
        let mut depth = SampleFrame::blank(64, 48, SensorChannel::Depth);
        for _ in 0..33 {
            source.next_depth(&mut depth).unwrap();
        }
        // frame 32: dome centered at (32, 24)
        let at = |x: usize, y: usize| depth.data()[y * 64 + x];
        assert_eq!(at(0, 10), 0);
        assert_eq!(at(32, 24), NEAREST_DEPTH);
        assert_eq!(at(63, 0), BACKGROUND_DEPTH);
        assert!(at(36, 24) > NEAREST_DEPTH && at(36, 24) < BACKGROUND_DEPTH);
    }

    #[test]
    fn test_infrared_stays_within_ten_bits() {
        let runtime = CaptureRuntime::unregistered();
        let mut source = open_source(&runtime, 32, 4);
        let mut ir = SampleFrame::blank(32, 4, SensorChannel::Infrared);
        source.next_ir(&mut ir).unwrap();
        assert_eq!(ir.data()[0], 0);
        assert!(ir.data().iter().all(|&v| v <= 1023));
        assert!(ir.data()[31] > ir.data()[1]);
    }

    #[test]
    fn test_mismatched_buffer_is_read_error() {
        let runtime = CaptureRuntime::unregistered();
        let mut source = open_source(&runtime, 8, 8);
        let mut depth = SampleFrame::blank(4, 4, SensorChannel::Depth);
        assert!(matches!(
            source.next_depth(&mut depth),
            Err(CaptureError::Read { index: 0, .. })
        ));
    }

    #[test]
    fn test_close_then_reopen_restarts_indices() {
        let runtime = CaptureRuntime::unregistered();
        let mut source = open_source(&runtime, 8, 8);
        let mut frame = Frame::blank(8, 8, PixelFormat::Rgb8);
        source.next_color(&mut frame).unwrap();
        source.next_color(&mut frame).unwrap();

        source.close();
        source.close();
        assert!(source.profiles().is_empty());

        source.open().unwrap();
        source.next_color(&mut frame).unwrap();
        assert_eq!(frame.index(), 0);
    }
}
