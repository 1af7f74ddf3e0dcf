use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The device or stream could not be acquired. Session never started.
    #[error("failed to open capture source: {0}")]
    Open(String),
    /// `read` was called before a successful `open`.
    #[error("capture source is not open")]
    NotOpen,
    /// A mid-session read failed. Fatal to the session, not the process.
    #[error("frame read failed: {0}")]
    Read(String),
    /// A finite source ran out of frames. Ends the session cleanly.
    #[error("capture source reached end of stream")]
    EndOfStream,
}

/// Properties of an opened capture source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Owns the capture device handle: acquire, read on demand, release.
///
/// `read` may block waiting for hardware; only the capture loop's own
/// thread calls it. `release` must be safe to call repeatedly.
pub trait FrameSource: Send {
    /// Acquires the device. Calling it on an already-open source is a
    /// no-op returning the existing [`SourceInfo`].
    fn open(&mut self) -> Result<SourceInfo, CaptureError>;

    /// Produces the next frame, blocking until one is available.
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Releases the device. No-op after the first call.
    fn release(&mut self);
}
