pub mod fps_counter;
pub mod live_preview_use_case;
pub mod loop_state;
pub mod pipeline_logger;
pub mod preview_settings;
