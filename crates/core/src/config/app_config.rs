use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::face_detector::DetectorSettings;
use crate::detection::domain::landmark_variant::LandmarkSettings;
use crate::detection::infrastructure::detector_factory::{detector_model, landmark_model};
use crate::pipeline::preview_settings::PreviewSettings;
use crate::shared::channel::ChannelSet;
use crate::shared::constants::{DEFAULT_CAPTURE_FPS, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH};
use crate::visualization::domain::depth_colorizer::DepthRamp;
use crate::visualization::domain::infrared_normalizer::InfraredScale;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where frames come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Generated test patterns.
    #[default]
    Synthetic,
    /// PNG sequences captured earlier.
    Recorded,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Synthetic => write!(f, "synthetic"),
            SourceKind::Recorded => write!(f, "recorded"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: SourceKind,
    /// Capture directory with `color/`, `depth/` and `ir/` subdirectories.
    pub recording: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Playback rate; 0 runs unpaced.
    pub fps: f64,
    pub channels: ChannelSet,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            recording: None,
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
            fps: DEFAULT_CAPTURE_FPS,
            channels: ChannelSet::default(),
        }
    }
}

/// Everything the preview binary can be configured with.
///
/// Loaded from JSON; every field is optional and falls back to its default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub depth: DepthRamp,
    pub infrared: InfraredScale,
    pub detection: DetectorSettings,
    pub landmarks: LandmarkSettings,
    pub preview: PreviewSettings,
}

impl AppConfig {
    /// `<config dir>/DepthFace/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("DepthFace").join("config.json"))
    }

    /// Reads and parses a config file. Does not validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` when given, else the default location when a file exists
    /// there, else the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capture = &self.capture;
        if capture.channels.is_empty() {
            return invalid("at least one channel must be enabled");
        }
        if !capture.fps.is_finite() || capture.fps < 0.0 {
            return invalid(format!("capture fps must be >= 0, got {}", capture.fps));
        }
        match capture.source {
            SourceKind::Synthetic if capture.width == 0 || capture.height == 0 => {
                return invalid(format!(
                    "synthetic source needs a positive size, got {}x{}",
                    capture.width, capture.height
                ));
            }
            SourceKind::Recorded if capture.recording.is_none() => {
                return invalid("recorded source needs a recording directory");
            }
            _ => {}
        }

        if self.depth.bucket_size == 0 {
            return invalid("depth bucket size must be > 0");
        }
        if self.infrared.full_scale == 0 {
            return invalid("infrared full scale must be > 0");
        }

        let detection = &self.detection;
        if let Some(confidence) = detection.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return invalid(format!("confidence must be in [0, 1], got {confidence}"));
            }
        }
        if !(detection.input_scale.is_finite() && detection.input_scale > 0.0) {
            return invalid(format!(
                "detector input scale must be > 0, got {}",
                detection.input_scale
            ));
        }
        if capture.channels.color
            && detection.model_path.is_none()
            && detector_model(detection.kind).url.is_none()
        {
            return invalid(format!(
                "{:?} detector has no download URL; set its model path",
                detection.kind
            ));
        }

        let landmarks = &self.landmarks;
        if landmarks.enabled {
            if landmarks.model_path.is_none() && landmark_model(landmarks.variant).url.is_none() {
                return invalid(format!(
                    "{} landmark model has no download URL; set its model path",
                    landmarks.variant
                ));
            }
            if !(landmarks.margin.is_finite() && landmarks.margin > 0.0) {
                return invalid(format!("landmark margin must be > 0, got {}", landmarks.margin));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}
