use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use depthface_core::capture::domain::frame_source::FrameSource;
use depthface_core::capture::domain::stream_geometry::StreamGeometry;
use depthface_core::capture::infrastructure::capture_runtime::CaptureRuntime;
use depthface_core::config::app_config::{AppConfig, SourceKind};
use depthface_core::detection::domain::face_detector::DetectorKind;
use depthface_core::detection::domain::landmark_variant::LandmarkVariant;
use depthface_core::detection::infrastructure::detector_factory::{
    create_detector, create_landmark_detector, detector_model, landmark_model,
    resolve_detector_model, resolve_landmark_model,
};
use depthface_core::pipeline::live_preview_use_case::LivePreviewUseCase;
use depthface_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use depthface_core::pipeline::preview_settings::DropPolicy;
use depthface_core::preview::domain::preview_surface::PreviewSurface;
use depthface_core::visualization::domain::depth_colorizer::DepthColorizer;

/// Live depth camera preview with face and landmark overlays.
///
/// Shows color, depth and infrared windows; Escape quits.
#[derive(Parser, Debug)]
#[command(name = "depthface")]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame source.
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Capture directory with color/, depth/ and ir/ PNG sequences.
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Synthetic source width.
    #[arg(long)]
    width: Option<u32>,

    /// Synthetic source height.
    #[arg(long)]
    height: Option<u32>,

    /// Capture rate (0 = as fast as possible).
    #[arg(long)]
    fps: Option<f64>,

    #[arg(long)]
    no_color: bool,

    #[arg(long)]
    no_depth: bool,

    #[arg(long)]
    no_ir: bool,

    /// Face detection network.
    #[arg(long, value_enum)]
    detector: Option<DetectorArg>,

    /// Face detection model file (default: downloaded YuNet).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f32>,

    /// Fit facial landmarks: 5 or 68 points.
    #[arg(long, value_enum)]
    landmarks: Option<LandmarkArg>,

    /// Landmark model file.
    #[arg(long)]
    landmark_model: Option<PathBuf>,

    /// Stop after this many frames, shown or dropped.
    #[arg(long)]
    max_frames: Option<usize>,

    /// What to do when a frame cannot be read.
    #[arg(long, value_enum)]
    drop_policy: Option<DropPolicyArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Synthetic,
    Recorded,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DetectorArg {
    Yunet,
    Blazeface,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LandmarkArg {
    #[value(name = "5")]
    Five,
    #[value(name = "68")]
    SixtyEight,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DropPolicyArg {
    Skip,
    Abort,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let runtime = CaptureRuntime::initialize()?;
    let source = open_source(&runtime, &config);
    let surface = open_surface(&config);
    let colorizer = DepthColorizer::new(config.depth);

    let mut use_case = LivePreviewUseCase::new(
        source,
        surface,
        colorizer,
        config.infrared,
        config.preview.clone(),
        Box::new(StdoutPipelineLogger::default()),
    );

    if config.capture.channels.color {
        log::info!(
            "Resolving detector model: {}",
            detector_model(config.detection.kind).name
        );
        let model_path =
            resolve_detector_model(&config.detection, Some(Box::new(download_progress)))?;
        use_case = use_case.with_detector(create_detector(&config.detection, &model_path)?);

        if config.landmarks.enabled {
            log::info!(
                "Resolving landmark model: {}",
                landmark_model(config.landmarks.variant).name
            );
            let model_path = resolve_landmark_model(&config.landmarks)?;
            use_case = use_case
                .with_landmarks(create_landmark_detector(&config.landmarks, &model_path)?);
        }
    } else if config.landmarks.enabled {
        log::warn!("Landmarks need the color channel; skipping");
    }

    let report = use_case.execute()?;
    log::info!(
        "Exited on {} after {} frames ({} dropped, last {} fps)",
        report.exit,
        report.frames_shown,
        report.frames_dropped,
        report.last_fps
    );
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    let capture = &mut config.capture;
    if let Some(source) = cli.source {
        capture.source = match source {
            SourceArg::Synthetic => SourceKind::Synthetic,
            SourceArg::Recorded => SourceKind::Recorded,
        };
    }
    if let Some(recording) = &cli.recording {
        capture.recording = Some(recording.clone());
        // a recording implies playback unless told otherwise
        if cli.source.is_none() {
            capture.source = SourceKind::Recorded;
        }
    }
    if let Some(width) = cli.width {
        capture.width = width;
    }
    if let Some(height) = cli.height {
        capture.height = height;
    }
    if let Some(fps) = cli.fps {
        capture.fps = fps;
    }
    capture.channels.color &= !cli.no_color;
    capture.channels.depth &= !cli.no_depth;
    capture.channels.infrared &= !cli.no_ir;

    if let Some(detector) = cli.detector {
        config.detection.kind = match detector {
            DetectorArg::Yunet => DetectorKind::Yunet,
            DetectorArg::Blazeface => DetectorKind::Blazeface,
        };
    }
    if let Some(path) = &cli.detector_model {
        config.detection.model_path = Some(path.clone());
    }
    if let Some(confidence) = cli.confidence {
        config.detection.confidence = Some(confidence);
    }

    if let Some(landmarks) = cli.landmarks {
        config.landmarks.enabled = true;
        config.landmarks.variant = match landmarks {
            LandmarkArg::Five => LandmarkVariant::FivePoint,
            LandmarkArg::SixtyEight => LandmarkVariant::SixtyEightPoint,
        };
    }
    if let Some(path) = &cli.landmark_model {
        config.landmarks.enabled = true;
        config.landmarks.model_path = Some(path.clone());
    }

    if let Some(max_frames) = cli.max_frames {
        config.preview.max_frames = Some(max_frames);
    }
    if let Some(policy) = cli.drop_policy {
        config.preview.drop_policy = match policy {
            DropPolicyArg::Skip => DropPolicy::Skip,
            DropPolicyArg::Abort => DropPolicy::Abort,
        };
    }
}

fn open_source<'rt>(runtime: &'rt CaptureRuntime, config: &AppConfig) -> Box<dyn FrameSource + 'rt> {
    let capture = &config.capture;
    match (capture.source, &capture.recording) {
        (SourceKind::Recorded, Some(root)) => {
            log::info!("Replaying {}", root.display());
            Box::new(runtime.recorded(root, capture.channels, capture.fps))
        }
        // validate() rejects a recorded source without a directory
        _ => {
            let geometry = StreamGeometry::new(capture.width, capture.height);
            log::info!("Synthetic source at {geometry}");
            Box::new(runtime.synthetic(geometry, capture.channels, capture.fps))
        }
    }
}

#[cfg(feature = "highgui")]
fn open_surface(_config: &AppConfig) -> Box<dyn PreviewSurface> {
    use depthface_core::preview::infrastructure::highgui_surface::HighguiSurface;
    Box::new(HighguiSurface::new())
}

#[cfg(not(feature = "highgui"))]
fn open_surface(config: &AppConfig) -> Box<dyn PreviewSurface> {
    use depthface_core::preview::infrastructure::headless_surface::HeadlessSurface;
    if config.preview.max_frames.is_none() {
        log::warn!("Built without a display; running until interrupted (use --max-frames)");
    }
    Box::new(HeadlessSurface::new())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}
