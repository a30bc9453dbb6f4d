pub const YUNET_MODEL_NAME: &str = "face_detection_yunet_2023mar.onnx";
pub const YUNET_MODEL_URL: &str =
    "https://github.com/opencv/opencv_zoo/raw/main/models/face_detection_yunet/face_detection_yunet_2023mar.onnx";

pub const BLAZEFACE_MODEL_NAME: &str = "blazeface_short_range.onnx";

pub const LANDMARK_5_MODEL_NAME: &str = "face_landmarks_5.onnx";
pub const LANDMARK_68_MODEL_NAME: &str = "face_landmarks_68.onnx";

/// Escape.
pub const QUIT_KEY: i32 = 27;

/// Key poll timeout; doubles as the loop's pacing delay.
pub const KEY_POLL_TIMEOUT_MS: u64 = 10;

/// Width of one FPS measurement window.
pub const FPS_WINDOW_MS: u64 = 1000;

/// Raw distance units per color-ramp bucket.
pub const DEFAULT_BUCKET_SIZE: u16 = 30;

/// Samples beyond this raw distance render as "no data".
pub const DEFAULT_MAX_DISTANCE: u16 = 1500;

/// Full-scale value of the 10-bit infrared sensor.
pub const DEFAULT_IR_FULL_SCALE: u16 = 1023;

pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;
pub const DEFAULT_CAPTURE_FPS: f64 = 30.0;
