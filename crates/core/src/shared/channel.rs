use serde::{Deserialize, Serialize};

/// One of the three sensor streams of a structured-light camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorChannel {
    Color,
    Depth,
    Infrared,
}

impl SensorChannel {
    pub const ALL: [SensorChannel; 3] = [
        SensorChannel::Color,
        SensorChannel::Depth,
        SensorChannel::Infrared,
    ];

    /// Name used for preview windows and capture subdirectories.
    pub fn label(self) -> &'static str {
        match self {
            SensorChannel::Color => "Color",
            SensorChannel::Depth => "Depth",
            SensorChannel::Infrared => "IR",
        }
    }
}

impl std::fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorChannel::Color => write!(f, "color"),
            SensorChannel::Depth => write!(f, "depth"),
            SensorChannel::Infrared => write!(f, "infrared"),
        }
    }
}

/// Which channels a capture session should start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSet {
    #[serde(default = "enabled")]
    pub color: bool,
    #[serde(default = "enabled")]
    pub depth: bool,
    #[serde(default = "enabled")]
    pub infrared: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::all()
    }
}

impl ChannelSet {
    pub fn all() -> Self {
        Self {
            color: true,
            depth: true,
            infrared: true,
        }
    }

    pub fn contains(&self, channel: SensorChannel) -> bool {
        match channel {
            SensorChannel::Color => self.color,
            SensorChannel::Depth => self.depth,
            SensorChannel::Infrared => self.infrared,
        }
    }

    /// Enabled channels in color, depth, infrared order.
    pub fn iter(&self) -> impl Iterator<Item = SensorChannel> + '_ {
        SensorChannel::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
