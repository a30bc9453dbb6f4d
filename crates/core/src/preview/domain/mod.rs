pub mod preview_surface;
