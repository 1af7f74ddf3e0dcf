use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("face location inference failed: {0}")]
    Inference(String),
}

/// Domain interface for face location.
///
/// An empty region list is a valid, common result; no faces is not an
/// error. Implementations may be stateful, hence `&mut self`.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, LocateError>;
}
