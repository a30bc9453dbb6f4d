use std::time::{Duration, Instant};

use crate::capture::domain::capture_error::CaptureError;
use crate::capture::domain::frame_source::FrameSource;
use crate::capture::domain::stream_geometry::StreamGeometry;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::preview::domain::preview_surface::PreviewSurface;
use crate::shared::channel::{ChannelSet, SensorChannel};
use crate::shared::frame::{Frame, PixelFormat, SampleFrame};
use crate::shared::landmark_set::FrameAnnotations;
use crate::visualization::domain::depth_colorizer::DepthColorizer;
use crate::visualization::domain::infrared_normalizer::{normalize_frame, InfraredScale};
use crate::visualization::domain::overlay;

use super::fps_counter::FpsCounter;
use super::loop_state::{ExitReason, LoopState};
use super::pipeline_logger::PipelineLogger;
use super::preview_settings::{DropPolicy, PreviewSettings};

/// How a preview session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub frames_shown: usize,
    pub frames_dropped: usize,
    pub exit: ExitReason,
    pub last_fps: u32,
}

/// Capture buffers, allocated once after the source is opened.
struct Buffers {
    color: Option<Frame>,
    depth: Option<(SampleFrame, Frame)>,
    ir: Option<(SampleFrame, Frame)>,
}

impl Buffers {
    fn allocate(geometry: StreamGeometry, channels: ChannelSet) -> Self {
        let (w, h) = (geometry.width, geometry.height);
        Self {
            color: channels
                .color
                .then(|| Frame::blank(w, h, PixelFormat::Bgr8)),
            depth: channels.depth.then(|| {
                (
                    SampleFrame::blank(w, h, SensorChannel::Depth),
                    Frame::blank(w, h, PixelFormat::Bgr8),
                )
            }),
            ir: channels.infrared.then(|| {
                (
                    SampleFrame::blank(w, h, SensorChannel::Infrared),
                    Frame::blank(w, h, PixelFormat::Gray8),
                )
            }),
        }
    }

    /// The view the status text goes on: color, else depth, else infrared.
    fn primary_view_mut(&mut self) -> Option<&mut Frame> {
        if let Some(color) = self.color.as_mut() {
            return Some(color);
        }
        if let Some((_, view)) = self.depth.as_mut() {
            return Some(view);
        }
        self.ir.as_mut().map(|(_, view)| view)
    }

    fn index(&self) -> usize {
        self.color
            .as_ref()
            .map(|f| f.index())
            .or_else(|| self.depth.as_ref().map(|(s, _)| s.index()))
            .or_else(|| self.ir.as_ref().map(|(s, _)| s.index()))
            .unwrap_or(0)
    }
}

/// Drives the live preview: acquire, detect, annotate, present, poll.
///
/// Single-threaded and synchronous. The only parallel work is the per-pixel
/// depth and infrared conversion. This is a single-use struct: `execute`
/// consumes it and closes the source and surface on every exit path.
pub struct LivePreviewUseCase<'a> {
    source: Box<dyn FrameSource + 'a>,
    surface: Box<dyn PreviewSurface + 'a>,
    detector: Option<Box<dyn FaceDetector>>,
    landmarks: Option<Box<dyn LandmarkDetector>>,
    colorizer: DepthColorizer,
    ir_scale: InfraredScale,
    settings: PreviewSettings,
    logger: Box<dyn PipelineLogger + 'a>,
}

impl<'a> LivePreviewUseCase<'a> {
    pub fn new(
        source: Box<dyn FrameSource + 'a>,
        surface: Box<dyn PreviewSurface + 'a>,
        colorizer: DepthColorizer,
        ir_scale: InfraredScale,
        settings: PreviewSettings,
        logger: Box<dyn PipelineLogger + 'a>,
    ) -> Self {
        Self {
            source,
            surface,
            detector: None,
            landmarks: None,
            colorizer,
            ir_scale,
            settings,
            logger,
        }
    }

    /// Runs face detection on every color frame.
    pub fn with_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Fits landmarks inside every detected face.
    pub fn with_landmarks(mut self, landmarks: Box<dyn LandmarkDetector>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// Opens the source and runs until the quit key, the frame budget or a
    /// closed window ends the session.
    pub fn execute(mut self) -> Result<SessionReport, Box<dyn std::error::Error>> {
        let geometry = match self.source.open() {
            Ok(geometry) => geometry,
            Err(e) => {
                self.source.close();
                self.surface.close();
                return Err(e.into());
            }
        };

        let result = self.run(geometry);

        self.source.close();
        self.surface.close();
        self.logger.summary();
        if let Ok(report) = &result {
            self.logger.info(&format!(
                "Preview ended ({}): {} frames shown, {} dropped",
                report.exit, report.frames_shown, report.frames_dropped
            ));
        }
        result
    }

    fn run(&mut self, geometry: StreamGeometry) -> Result<SessionReport, Box<dyn std::error::Error>> {
        let profiles = self.source.profiles();
        let has = |channel: SensorChannel| profiles.iter().any(|p| p.channel == channel);
        let channels = ChannelSet {
            color: has(SensorChannel::Color),
            depth: has(SensorChannel::Depth),
            infrared: has(SensorChannel::Infrared),
        };
        let mut buffers = Buffers::allocate(geometry, channels);
        let mut annotations = FrameAnnotations::new();
        let mut fps = FpsCounter::new();
        let mut state = LoopState::Running;
        let poll_timeout = Duration::from_millis(self.settings.poll_timeout_ms);
        let mut shown = 0;
        let mut dropped = 0;

        let exit = loop {
            state = state.on_frame_count(shown + dropped, self.settings.max_frames);
            if let LoopState::Exiting(reason) = state {
                break reason;
            }

            // 1. Acquire
            let start = Instant::now();
            if let Err(e) = self.acquire(&mut buffers) {
                match self.settings.drop_policy {
                    DropPolicy::Abort => return Err(e.into()),
                    DropPolicy::Skip => {
                        dropped += 1;
                        log::warn!("Dropped frame: {e}");
                        // keep the window responsive while the source struggles
                        state = self.poll(state, poll_timeout)?;
                        if let LoopState::Exiting(reason) = state {
                            break reason;
                        }
                        continue;
                    }
                }
            }
            self.logger.timing("capture", elapsed_ms(start));

            // 2. Detect and fit landmarks on the color frame
            if let Some(color) = buffers.color.as_mut() {
                annotations.reset(color.index());
                self.analyze(color, &mut annotations);
                overlay::annotate(color, &annotations);
            }

            // 3. Render depth and infrared views
            let start = Instant::now();
            if let Some((samples, view)) = buffers.depth.as_mut() {
                self.colorizer.colorize(samples, view)?;
            }
            if let Some((samples, view)) = buffers.ir.as_mut() {
                normalize_frame(samples, view, &self.ir_scale)?;
            }
            self.logger.timing("colorize", elapsed_ms(start));

            if self.settings.show_fps {
                if let Some(view) = buffers.primary_view_mut() {
                    overlay::draw_fps(view, fps.fps());
                }
            }

            // 4. Present
            let start = Instant::now();
            self.present(&buffers)?;
            self.logger.timing("present", elapsed_ms(start));

            // 5. Poll input, which also paces the loop
            state = self.poll(state, poll_timeout)?;

            // 6. Count
            shown += 1;
            self.logger.frame(buffers.index());
            if let Some(rate) = fps.tick() {
                log::debug!("FPS: {rate}");
                self.logger.metric("fps", rate as f64);
            }

            if let LoopState::Exiting(reason) = state {
                break reason;
            }
        };

        Ok(SessionReport {
            frames_shown: shown,
            frames_dropped: dropped,
            exit,
            last_fps: fps.fps(),
        })
    }

    /// Reads every enabled channel: depth, color, then infrared.
    fn acquire(&mut self, buffers: &mut Buffers) -> Result<(), CaptureError> {
        if let Some((samples, _)) = buffers.depth.as_mut() {
            self.source.next_depth(samples)?;
        }
        if let Some(color) = buffers.color.as_mut() {
            self.source.next_color(color)?;
        }
        if let Some((samples, _)) = buffers.ir.as_mut() {
            self.source.next_ir(samples)?;
        }
        Ok(())
    }

    /// Fills `annotations` for this frame. Failures leave it empty.
    fn analyze(&mut self, color: &Frame, annotations: &mut FrameAnnotations) {
        let Some(detector) = self.detector.as_mut() else {
            return;
        };

        let start = Instant::now();
        let faces = match detector.detect(color) {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("Face detection failed on frame {}: {e}", color.index());
                return;
            }
        };
        self.logger.timing("detect", elapsed_ms(start));
        self.logger.metric("faces", faces.len() as f64);

        if let Some(landmarks) = self.landmarks.as_mut().filter(|_| !faces.is_empty()) {
            let start = Instant::now();
            match landmarks.locate(color, &faces) {
                Ok(sets) => annotations.set_landmarks(sets),
                Err(e) => {
                    log::warn!("Landmark fitting failed on frame {}: {e}", color.index());
                    return;
                }
            }
            self.logger.timing("landmarks", elapsed_ms(start));
        }
        annotations.set_faces(faces);
    }

    fn present(&mut self, buffers: &Buffers) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(color) = &buffers.color {
            self.surface.present(SensorChannel::Color.label(), color)?;
        }
        if let Some((_, view)) = &buffers.depth {
            self.surface.present(SensorChannel::Depth.label(), view)?;
        }
        if let Some((_, view)) = &buffers.ir {
            self.surface.present(SensorChannel::Infrared.label(), view)?;
        }
        Ok(())
    }

    fn poll(&mut self, state: LoopState, timeout: Duration) -> Result<LoopState, Box<dyn std::error::Error>> {
        let key = self.surface.poll_key(timeout)?;
        Ok(state
            .on_key(key, self.settings.quit_key)
            .on_surface(self.surface.is_open()))
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
