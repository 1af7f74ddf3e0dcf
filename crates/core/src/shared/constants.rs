/// Bound on the in-memory emotion history ring.
pub const HISTORY_CAPACITY: usize = 100;

/// How many recent history entries a stats snapshot carries.
pub const RECENT_HISTORY_LIMIT: usize = 20;

/// Side length of the classifier's square grayscale input.
pub const CLASSIFIER_INPUT_SIZE: u32 = 48;

/// JPEG quality for published frame packets.
pub const JPEG_QUALITY: u8 = 80;

pub const FACE_MODEL_NAME: &str = "blazeface_short_range.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/moodcam/moodcam/releases/download/v0.1.0/blazeface_short_range.onnx";

pub const EMOTION_MODEL_NAME: &str = "fer_emotion_7.onnx";
pub const EMOTION_MODEL_URL: &str =
    "https://github.com/moodcam/moodcam/releases/download/v0.1.0/fer_emotion_7.onnx";
