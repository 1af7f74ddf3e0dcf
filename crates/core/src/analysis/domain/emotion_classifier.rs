use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::prediction::Prediction;

#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Malformed input: a zero-area face crop cannot be classified.
    #[error("cannot classify empty face region ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },
    #[error("emotion inference failed: {0}")]
    Inference(String),
}

/// Domain interface for emotion classification of one face crop.
///
/// A failure for one face must never abort its siblings: the caller
/// absorbs per-face errors and continues with the rest of the frame.
pub trait EmotionClassifier: Send {
    fn classify(&mut self, face: &Frame) -> Result<Prediction, ClassifyError>;
}
