use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Point layout a landmark model regresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandmarkVariant {
    /// Eye centers, nose tip, mouth corners.
    #[serde(rename = "5")]
    FivePoint,
    /// iBUG 300-W layout.
    #[default]
    #[serde(rename = "68")]
    SixtyEightPoint,
}

impl LandmarkVariant {
    pub fn point_count(self) -> usize {
        match self {
            LandmarkVariant::FivePoint => 5,
            LandmarkVariant::SixtyEightPoint => 68,
        }
    }

    /// Side of the square model input, in pixels.
    pub fn input_size(self) -> u32 {
        112
    }
}

impl fmt::Display for LandmarkVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-point", self.point_count())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSettings {
    pub enabled: bool,
    pub variant: LandmarkVariant,
    pub model_path: Option<PathBuf>,
    /// Crop side relative to the longer side of the face box.
    pub margin: f64,
}

impl Default for LandmarkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            variant: LandmarkVariant::default(),
            model_path: None,
            margin: 1.2,
        }
    }
}
