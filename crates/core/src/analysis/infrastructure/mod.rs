pub mod model_resolver;
pub mod onnx_blazeface_locator;
pub mod onnx_emotion_classifier;
