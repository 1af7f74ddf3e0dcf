use serde::Serialize;

use crate::shared::prediction::Prediction;
use crate::shared::region::FaceRegion;

/// One located face with its classification.
#[derive(Clone, Debug, Serialize)]
pub struct FaceResult {
    pub region: FaceRegion,
    pub prediction: Prediction,
}

/// One fully processed frame as published to consumers.
///
/// `jpeg` holds the annotated frame encoded for display or storage; it
/// is skipped when the packet itself is serialized.
#[derive(Clone, Debug, Serialize)]
pub struct FramePacket {
    pub index: u64,
    pub timestamp_ms: u64,
    pub faces: Vec<FaceResult>,
    #[serde(skip)]
    pub jpeg: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::emotion::Emotion;

    #[test]
    fn test_serialization_skips_jpeg_payload() {
        let mut scores = [0.0; Emotion::COUNT];
        scores[Emotion::Happy.index()] = 0.9;
        let packet = FramePacket {
            index: 3,
            timestamp_ms: 1500,
            faces: vec![FaceResult {
                region: FaceRegion::new(10, 20, 30, 40),
                prediction: Prediction::from_scores(scores),
            }],
            jpeg: vec![0xFF, 0xD8],
        };

        let json = serde_json::to_value(&packet).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["faces"][0]["region"]["x"], 10);
        assert_eq!(json["faces"][0]["prediction"]["label"], "Happy");
        assert!(json.get("jpeg").is_none());
    }
}
