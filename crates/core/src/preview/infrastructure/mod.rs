pub mod headless_surface;
#[cfg(feature = "highgui")]
pub mod highgui_surface;
