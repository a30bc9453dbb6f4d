pub mod channel;
pub mod constants;
pub mod detection_box;
pub mod frame;
pub mod landmark_set;
pub mod model_resolver;
