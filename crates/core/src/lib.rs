pub mod capture;
pub mod config;
pub mod detection;
pub mod pipeline;
pub mod preview;
pub mod shared;
pub mod visualization;
