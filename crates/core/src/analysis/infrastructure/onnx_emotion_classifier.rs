use std::path::Path;

use crate::analysis::domain::emotion_classifier::{ClassifyError, EmotionClassifier};
use crate::shared::constants::CLASSIFIER_INPUT_SIZE;
use crate::shared::emotion::Emotion;
use crate::shared::frame::Frame;
use crate::shared::prediction::Prediction;

/// Emotion classifier backed by a FER-style ONNX Runtime session.
///
/// Expects the model contract of the common facial-expression CNNs:
/// one 48x48 grayscale input normalized to [0,1], one 7-way output in
/// the fixed category order. Logit outputs are softmaxed so scores are
/// always comparable confidences.
pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
}

impl OnnxEmotionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, ClassifyError> {
        let session = ort::session::Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        Ok(Self { session })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&mut self, face: &Frame) -> Result<Prediction, ClassifyError> {
        if face.width() == 0 || face.height() == 0 {
            return Err(ClassifyError::EmptyRegion {
                width: face.width(),
                height: face.height(),
            });
        }

        let tensor = preprocess(face, CLASSIFIER_INPUT_SIZE);
        let input = ort::value::Tensor::from_array(tensor)
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let raw = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;
        let values = raw
            .as_slice()
            .ok_or_else(|| ClassifyError::Inference("non-contiguous model output".into()))?;
        if values.len() < Emotion::COUNT {
            return Err(ClassifyError::Inference(format!(
                "expected {} scores, got {}",
                Emotion::COUNT,
                values.len()
            )));
        }

        let mut scores = [0.0f32; Emotion::COUNT];
        scores.copy_from_slice(&values[..Emotion::COUNT]);
        Ok(Prediction::from_scores(normalize(scores)))
    }
}

/// Grayscale, resize to `size` x `size`, scale to [0,1], NCHW float32.
fn preprocess(face: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = face.as_ndarray();
    let (src_h, src_w) = (face.height() as usize, face.width() as usize);
    let channels = face.channels() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 1, s, s));
    for y in 0..s {
        let sy = (((y as f32 + 0.5) * src_h as f32 / s as f32) as usize).min(src_h - 1);
        for x in 0..s {
            let sx = (((x as f32 + 0.5) * src_w as f32 / s as f32) as usize).min(src_w - 1);
            let gray = if channels >= 3 {
                // ITU-R BT.601 luma weights
                0.299 * src[[sy, sx, 0]] as f32
                    + 0.587 * src[[sy, sx, 1]] as f32
                    + 0.114 * src[[sy, sx, 2]] as f32
            } else {
                src[[sy, sx, 0]] as f32
            };
            tensor[[0, 0, y, x]] = gray / 255.0;
        }
    }
    tensor
}

/// Softmax when the model emitted logits; pass through probabilities.
fn normalize(scores: [f32; Emotion::COUNT]) -> [f32; Emotion::COUNT] {
    let in_unit_range = scores.iter().all(|&s| (0.0..=1.0).contains(&s));
    if in_unit_range {
        return scores;
    }

    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut out = scores.map(|s| (s - max).exp());
    let sum: f32 = out.iter().sum();
    for value in &mut out {
        *value /= sum;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preprocess_shape() {
        let face = Frame::new(vec![100u8; 60 * 80 * 3], 60, 80, 3, 0);
        let tensor = preprocess(&face, CLASSIFIER_INPUT_SIZE);
        assert_eq!(tensor.shape(), &[1, 1, 48, 48]);
    }

    #[test]
    fn test_preprocess_grayscale_weights() {
        // Pure green: luma = 0.587
        let mut data = vec![0u8; 10 * 10 * 3];
        for pixel in data.chunks_mut(3) {
            pixel[1] = 255;
        }
        let face = Frame::new(data, 10, 10, 3, 0);
        let tensor = preprocess(&face, CLASSIFIER_INPUT_SIZE);
        assert_relative_eq!(tensor[[0, 0, 24, 24]], 0.587, epsilon = 0.01);
    }

    #[test]
    fn test_preprocess_accepts_single_channel() {
        let face = Frame::new(vec![128u8; 20 * 20], 20, 20, 1, 0);
        let tensor = preprocess(&face, CLASSIFIER_INPUT_SIZE);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 128.0 / 255.0, epsilon = 1e-5);
    }

    #[test]
    fn test_normalize_passes_probabilities_through() {
        let scores = [0.1, 0.1, 0.1, 0.4, 0.1, 0.1, 0.1];
        assert_eq!(normalize(scores), scores);
    }

    #[test]
    fn test_normalize_softmaxes_logits() {
        let normalized = normalize([2.0, -1.0, 0.5, 4.0, 0.0, -3.0, 1.0]);
        let sum: f32 = normalized.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
        // Largest logit keeps the largest probability
        let best = normalized
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(best, 3);
    }
}
