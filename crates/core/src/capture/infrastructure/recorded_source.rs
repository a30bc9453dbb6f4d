use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::FrameSource;
use crate::capture::domain::stream_geometry::{negotiate, ChannelProfile, StreamGeometry};
use crate::shared::channel::{ChannelSet, SensorChannel};
use crate::shared::frame::{Frame, PixelFormat, SampleFrame};

use super::capture_runtime::CaptureRuntime;
use super::frame_pacer::FramePacer;

/// Replays a capture directory as if it were a live camera.
///
/// Layout:
///
/// ```text
/// <root>/color/000000.png   8-bit RGB
/// <root>/depth/000000.png   16-bit gray, raw distance
/// <root>/ir/000000.png      16-bit gray, raw intensity
/// ```
///
/// Frames are played in file-name order and loop forever.
pub struct RecordedFrameSource<'rt> {
    root: PathBuf,
    channels: ChannelSet,
    fps: f64,
    tracks: Vec<Track>,
    profiles: Vec<ChannelProfile>,
    geometry: Option<StreamGeometry>,
    _runtime: PhantomData<&'rt CaptureRuntime>,
}

struct Track {
    channel: SensorChannel,
    files: Vec<PathBuf>,
    cursor: usize,
    delivered: usize,
    pacer: FramePacer,
}

impl Track {
    /// Next file to decode and the index it is delivered under.
    fn advance(&mut self) -> (PathBuf, usize) {
        self.pacer.wait();
        let path = self.files[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.files.len();
        let index = self.delivered;
        self.delivered += 1;
        (path, index)
    }
}

/// Subdirectory holding a channel's frames.
fn channel_dir(channel: SensorChannel) -> &'static str {
    match channel {
        SensorChannel::Color => "color",
        SensorChannel::Depth => "depth",
        SensorChannel::Infrared => "ir",
    }
}

impl<'rt> RecordedFrameSource<'rt> {
    pub(super) fn new(_runtime: &'rt CaptureRuntime, root: &Path, channels: ChannelSet, fps: f64) -> Self {
        Self {
            root: root.to_path_buf(),
            channels,
            fps,
            tracks: Vec::new(),
            profiles: Vec::new(),
            geometry: None,
            _runtime: PhantomData,
        }
    }

    fn open_track(&self, channel: SensorChannel) -> Result<(Track, ChannelProfile), CaptureError> {
        let dir = self.root.join(channel_dir(channel));
        let unavailable = |reason: String| CaptureError::ChannelUnavailable { channel, reason };

        let files = list_frames(&dir).map_err(unavailable)?;
        let first = files
            .first()
            .ok_or_else(|| unavailable(format!("no PNG frames in {}", dir.display())))?;
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| unavailable(format!("{}: {e}", first.display())))?;

        let profile = ChannelProfile::new(channel, StreamGeometry::new(width, height), self.fps);
        let track = Track {
            channel,
            files,
            cursor: 0,
            delivered: 0,
            pacer: FramePacer::new(self.fps),
        };
        Ok((track, profile))
    }

    /// Advances `channel` and checks the caller's buffer against the session.
    fn next_file(
        &mut self,
        channel: SensorChannel,
        buffer: (u32, u32),
    ) -> Result<(PathBuf, usize, StreamGeometry), CaptureError> {
        let geometry = self.geometry.ok_or(CaptureError::NotOpen(channel))?;
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.channel == channel)
            .ok_or(CaptureError::NotOpen(channel))?;
        let (path, index) = track.advance();

        if buffer != (geometry.width, geometry.height) {
            return Err(CaptureError::Read {
                channel,
                index,
                reason: format!("buffer is {}x{}, session is {geometry}", buffer.0, buffer.1),
            });
        }
        Ok((path, index, geometry))
    }

    fn read_samples(&mut self, channel: SensorChannel, frame: &mut SampleFrame) -> Result<(), CaptureError> {
        let (path, index, geometry) = self.next_file(channel, (frame.width(), frame.height()))?;
        let image = decode(&path, channel, index)?.to_luma16();
        check_dimensions(image.dimensions(), geometry, channel, index)?;

        frame.data_mut().copy_from_slice(image.as_raw());
        frame.set_index(index);
        Ok(())
    }
}

impl FrameSource for RecordedFrameSource<'_> {
    fn open(&mut self) -> Result<StreamGeometry, CaptureError> {
        self.close();
        if self.channels.is_empty() {
            return Err(CaptureError::NoChannelsEnabled);
        }
        if !self.root.is_dir() {
            return Err(CaptureError::NoDevice(format!(
                "recording directory {} does not exist",
                self.root.display()
            )));
        }

        let channels = self.channels;
        for channel in channels.iter() {
            let (track, profile) = self.open_track(channel).inspect_err(|_| self.close())?;
            self.tracks.push(track);
            self.profiles.push(profile);
        }

        let geometry = negotiate(&self.profiles).inspect_err(|_| self.close())?;
        self.geometry = Some(geometry);

        log::info!("Opened recording {}", self.root.display());
        for profile in &self.profiles {
            log::info!("  {profile}");
        }
        Ok(geometry)
    }

    fn profiles(&self) -> &[ChannelProfile] {
        &self.profiles
    }

    fn next_color(&mut self, frame: &mut Frame) -> Result<(), CaptureError> {
        let channel = SensorChannel::Color;
        let (path, index, geometry) = self.next_file(channel, (frame.width(), frame.height()))?;
        let image = decode(&path, channel, index)?.to_rgb8();
        check_dimensions(image.dimensions(), geometry, channel, index)?;

        match frame.format() {
            PixelFormat::Rgb8 => frame.data_mut().copy_from_slice(image.as_raw()),
            PixelFormat::Bgr8 => {
                for (dst, src) in frame.data_mut().chunks_exact_mut(3).zip(image.as_raw().chunks_exact(3)) {
                    dst.copy_from_slice(&[src[2], src[1], src[0]]);
                }
            }
            PixelFormat::Gray8 => {
                return Err(CaptureError::Read {
                    channel,
                    index,
                    reason: "color frames need an RGB or BGR buffer".to_string(),
                })
            }
        }
        frame.set_index(index);
        Ok(())
    }

    fn next_depth(&mut self, frame: &mut SampleFrame) -> Result<(), CaptureError> {
        self.read_samples(SensorChannel::Depth, frame)
    }

    fn next_ir(&mut self, frame: &mut SampleFrame) -> Result<(), CaptureError> {
        self.read_samples(SensorChannel::Infrared, frame)
    }

    fn close(&mut self) {
        if self.geometry.is_some() {
            log::debug!("Closing recording {}", self.root.display());
        }
        self.tracks.clear();
        self.profiles.clear();
        self.geometry = None;
    }
}

impl Drop for RecordedFrameSource<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

/// PNG files in `dir`, sorted by name.
fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(dir).map_err(|e| format!("{}: {e}", dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn decode(path: &Path, channel: SensorChannel, index: usize) -> Result<image::DynamicImage, CaptureError> {
    image::open(path).map_err(|e| CaptureError::Read {
        channel,
        index,
        reason: format!("{}: {e}", path.display()),
    })
}

fn check_dimensions(
    (width, height): (u32, u32),
    geometry: StreamGeometry,
    channel: SensorChannel,
    index: usize,
) -> Result<(), CaptureError> {
    if (width, height) == (geometry.width, geometry.height) {
        return Ok(());
    }
    Err(CaptureError::Read {
        channel,
        index,
        reason: format!("frame is {width}x{height}, session is {geometry}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, RgbImage};
    use tempfile::TempDir;

    type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

    fn write_color(root: &Path, name: &str, w: u32, h: u32, rgb: [u8; 3]) {
        let dir = root.join("color");
        fs::create_dir_all(&dir).unwrap();
        RgbImage::from_pixel(w, h, Rgb(rgb)).save(dir.join(name)).unwrap();
    }

    fn write_samples(root: &Path, sub: &str, name: &str, w: u32, h: u32, value: u16) {
        let dir = root.join(sub);
        fs::create_dir_all(&dir).unwrap();
        Gray16Image::from_pixel(w, h, Luma([value])).save(dir.join(name)).unwrap();
    }

    fn full_recording(w: u32, h: u32) -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_color(tmp.path(), "000000.png", w, h, [10, 20, 30]);
        write_color(tmp.path(), "000001.png", w, h, [40, 50, 60]);
        write_samples(tmp.path(), "depth", "000000.png", w, h, 750);
        write_samples(tmp.path(), "ir", "000000.png", w, h, 512);
        tmp
    }

    #[test]
    fn test_open_negotiates_all_channels() {
        let tmp = full_recording(4, 3);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);

        let geometry = source.open().unwrap();

        assert_eq!(geometry, StreamGeometry::new(4, 3));
        let channels: Vec<_> = source.profiles().iter().map(|p| p.channel).collect();
        assert_eq!(channels, SensorChannel::ALL.to_vec());
    }

    #[test]
    fn test_missing_root_is_no_device() {
        let tmp = TempDir::new().unwrap();
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(&tmp.path().join("absent"), ChannelSet::all(), 0.0);

        let err = source.open().unwrap_err();
        assert!(matches!(err, CaptureError::NoDevice(_)));
        assert!(source.profiles().is_empty());
    }

    #[test]
    fn test_missing_channel_dir_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        write_color(tmp.path(), "000000.png", 4, 3, [0, 0, 0]);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);

        let err = source.open().unwrap_err();
        assert!(matches!(
            err,
            CaptureError::ChannelUnavailable {
                channel: SensorChannel::Depth,
                ..
            }
        ));
        // partial open is released
        assert!(source.profiles().is_empty());
    }

    #[test]
    fn test_empty_channel_dir_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("color")).unwrap();
        let runtime = CaptureRuntime::unregistered();
        let channels = ChannelSet {
            color: true,
            depth: false,
            infrared: false,
        };
        let mut source = runtime.recorded(tmp.path(), channels, 0.0);

        let err = source.open().unwrap_err();
        assert!(err.to_string().contains("no PNG frames"));
    }

    #[test]
    fn test_disabled_channels_are_not_required() {
        let tmp = TempDir::new().unwrap();
        write_samples(tmp.path(), "depth", "a.png", 2, 2, 100);
        let runtime = CaptureRuntime::unregistered();
        let channels = ChannelSet {
            color: false,
            depth: true,
            infrared: false,
        };
        let mut source = runtime.recorded(tmp.path(), channels, 0.0);

        assert_eq!(source.open().unwrap(), StreamGeometry::new(2, 2));
        let mut color = Frame::blank(2, 2, PixelFormat::Bgr8);
        assert!(matches!(
            source.next_color(&mut color),
            Err(CaptureError::NotOpen(SensorChannel::Color))
        ));
    }

    #[test]
    fn test_no_channels_enabled() {
        let tmp = full_recording(2, 2);
        let runtime = CaptureRuntime::unregistered();
        let channels = ChannelSet {
            color: false,
            depth: false,
            infrared: false,
        };
        let mut source = runtime.recorded(tmp.path(), channels, 0.0);
        assert!(matches!(source.open(), Err(CaptureError::NoChannelsEnabled)));
    }

    #[test]
    fn test_resolution_mismatch_fails_open() {
        let tmp = TempDir::new().unwrap();
        write_color(tmp.path(), "0.png", 4, 4, [0, 0, 0]);
        write_samples(tmp.path(), "depth", "0.png", 2, 2, 0);
        write_samples(tmp.path(), "ir", "0.png", 4, 4, 0);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);

        assert!(matches!(
            source.open(),
            Err(CaptureError::ResolutionMismatch {
                channel: SensorChannel::Depth,
                ..
            })
        ));
    }

    #[test]
    fn test_color_frames_loop_and_convert_to_bgr() {
        let tmp = full_recording(2, 2);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);
        source.open().unwrap();
        let mut frame = Frame::blank(2, 2, PixelFormat::Bgr8);

        source.next_color(&mut frame).unwrap();
        assert_eq!(&frame.data()[..3], &[30, 20, 10]);
        assert_eq!(frame.index(), 0);

        source.next_color(&mut frame).unwrap();
        assert_eq!(&frame.data()[..3], &[60, 50, 40]);

        // wraps to the first file, index keeps counting
        source.next_color(&mut frame).unwrap();
        assert_eq!(&frame.data()[..3], &[30, 20, 10]);
        assert_eq!(frame.index(), 2);
    }

    #[test]
    fn test_color_into_rgb_buffer() {
        let tmp = full_recording(2, 2);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);
        source.open().unwrap();
        let mut frame = Frame::blank(2, 2, PixelFormat::Rgb8);

        source.next_color(&mut frame).unwrap();
        assert_eq!(&frame.data()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_depth_and_ir_samples_keep_16_bits() {
        let tmp = full_recording(3, 2);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);
        source.open().unwrap();

        let mut depth = SampleFrame::blank(3, 2, SensorChannel::Depth);
        source.next_depth(&mut depth).unwrap();
        assert!(depth.data().iter().all(|&d| d == 750));

        let mut ir = SampleFrame::blank(3, 2, SensorChannel::Infrared);
        source.next_ir(&mut ir).unwrap();
        assert!(ir.data().iter().all(|&v| v == 512));
    }

    #[test]
    fn test_odd_sized_frame_is_read_error() {
        let tmp = full_recording(2, 2);
        write_color(tmp.path(), "000002.png", 3, 3, [0, 0, 0]);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);
        source.open().unwrap();
        let mut frame = Frame::blank(2, 2, PixelFormat::Bgr8);

        source.next_color(&mut frame).unwrap();
        source.next_color(&mut frame).unwrap();
        let err = source.next_color(&mut frame).unwrap_err();
        assert!(matches!(err, CaptureError::Read { index: 2, .. }));

        // the next iteration recovers
        source.next_color(&mut frame).unwrap();
        assert_eq!(frame.index(), 3);
    }

    #[test]
    fn test_wrong_buffer_size_is_read_error() {
        let tmp = full_recording(2, 2);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);
        source.open().unwrap();

        let mut depth = SampleFrame::blank(4, 4, SensorChannel::Depth);
        assert!(matches!(
            source.next_depth(&mut depth),
            Err(CaptureError::Read { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let tmp = full_recording(2, 2);
        let runtime = CaptureRuntime::unregistered();
        let mut source = runtime.recorded(tmp.path(), ChannelSet::all(), 0.0);
        source.open().unwrap();

        source.close();
        source.close();

        assert!(source.profiles().is_empty());
        let mut ir = SampleFrame::blank(2, 2, SensorChannel::Infrared);
        assert!(matches!(
            source.next_ir(&mut ir),
            Err(CaptureError::NotOpen(SensorChannel::Infrared))
        ));
    }

    #[test]
    fn test_non_png_files_are_ignored() {
        let tmp = full_recording(2, 2);
        fs::write(tmp.path().join("color").join("notes.txt"), b"x").unwrap();
        let files = list_frames(&tmp.path().join("color")).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
    }
}
