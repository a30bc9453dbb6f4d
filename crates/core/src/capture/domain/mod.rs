pub mod capture_error;
pub mod frame_source;
pub mod stream_geometry;
