use std::path::{Path, PathBuf};

use crate::detection::domain::face_detector::{DetectorKind, DetectorSettings, FaceDetector};
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::detection::domain::landmark_variant::{LandmarkSettings, LandmarkVariant};
use crate::shared::constants::{
    BLAZEFACE_MODEL_NAME, LANDMARK_5_MODEL_NAME, LANDMARK_68_MODEL_NAME, YUNET_MODEL_NAME,
    YUNET_MODEL_URL,
};
use crate::shared::model_resolver::{self, ModelResolveError, ModelSpec, ProgressFn};

use super::onnx_blazeface_detector::OnnxBlazefaceDetector;
use super::onnx_landmark_regressor::OnnxLandmarkRegressor;
use super::onnx_yunet_detector::OnnxYunetDetector;

/// Model artifact a detector kind loads.
pub fn detector_model(kind: DetectorKind) -> ModelSpec {
    match kind {
        DetectorKind::Yunet => ModelSpec {
            name: YUNET_MODEL_NAME,
            url: Some(YUNET_MODEL_URL),
        },
        DetectorKind::Blazeface => ModelSpec {
            name: BLAZEFACE_MODEL_NAME,
            url: None,
        },
    }
}

/// Model artifact a landmark variant loads.
pub fn landmark_model(variant: LandmarkVariant) -> ModelSpec {
    let name = match variant {
        LandmarkVariant::FivePoint => LANDMARK_5_MODEL_NAME,
        LandmarkVariant::SixtyEightPoint => LANDMARK_68_MODEL_NAME,
    };
    ModelSpec { name, url: None }
}

/// Resolves the detector's model file: configured path, cache, download.
pub fn resolve_detector_model(
    settings: &DetectorSettings,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    model_resolver::resolve(
        settings.model_path.as_deref(),
        detector_model(settings.kind),
        progress,
    )
}

pub fn resolve_landmark_model(settings: &LandmarkSettings) -> Result<PathBuf, ModelResolveError> {
    model_resolver::resolve(
        settings.model_path.as_deref(),
        landmark_model(settings.variant),
        None,
    )
}

/// Creates the configured face detector from a resolved model file.
pub fn create_detector(
    settings: &DetectorSettings,
    model_path: &Path,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!(
        "Using {:?} detector (confidence={}) from {}",
        settings.kind,
        settings.effective_confidence(),
        model_path.display()
    );
    Ok(match settings.kind {
        DetectorKind::Yunet => Box::new(OnnxYunetDetector::new(model_path, settings)?),
        DetectorKind::Blazeface => Box::new(OnnxBlazefaceDetector::new(model_path, settings)?),
    })
}

pub fn create_landmark_detector(
    settings: &LandmarkSettings,
    model_path: &Path,
) -> Result<Box<dyn LandmarkDetector>, Box<dyn std::error::Error>> {
    Ok(Box::new(OnnxLandmarkRegressor::new(
        model_path,
        settings.variant,
        settings.margin,
    )?))
}
