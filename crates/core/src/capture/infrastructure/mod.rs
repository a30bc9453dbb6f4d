pub mod capture_runtime;
mod frame_pacer;
pub mod recorded_source;
pub mod synthetic_source;
