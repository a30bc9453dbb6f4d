pub mod detector_factory;
pub mod execution_provider;
mod nms;
pub mod onnx_blazeface_detector;
pub mod onnx_landmark_regressor;
pub mod onnx_yunet_detector;
