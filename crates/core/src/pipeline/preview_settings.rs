use serde::{Deserialize, Serialize};

use crate::shared::constants::{KEY_POLL_TIMEOUT_MS, QUIT_KEY};

/// What to do when a channel fails to deliver a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPolicy {
    /// Log a warning and move on to the next iteration.
    #[default]
    Skip,
    /// End the session with the read error.
    Abort,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Stop after this many iterations, shown or dropped.
    pub max_frames: Option<usize>,
    pub drop_policy: DropPolicy,
    pub show_fps: bool,
    /// Key wait per iteration; also paces the loop.
    pub poll_timeout_ms: u64,
    pub quit_key: i32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            max_frames: None,
            drop_policy: DropPolicy::default(),
            show_fps: true,
            poll_timeout_ms: KEY_POLL_TIMEOUT_MS,
            quit_key: QUIT_KEY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings: PreviewSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.drop_policy, DropPolicy::Skip);
        assert_eq!(settings.quit_key, 27);
        assert_eq!(settings.poll_timeout_ms, 10);
        assert!(settings.max_frames.is_none());
        assert!(settings.show_fps);
    }

    #[test]
    fn test_drop_policy_lowercase() {
        let settings: PreviewSettings =
            serde_json::from_str(r#"{"drop_policy": "abort", "max_frames": 3}"#).unwrap();
        assert_eq!(settings.drop_policy, DropPolicy::Abort);
        assert_eq!(settings.max_frames, Some(3));
    }
}
