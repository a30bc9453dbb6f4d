pub mod depth_colorizer;
pub mod infrared_normalizer;
pub mod overlay;
pub mod render_error;
