use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot encode {0}-channel frame as JPEG (expected 3)")]
    UnsupportedChannels(u8),
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Encodes an RGB frame as a JPEG byte buffer.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if frame.channels() != 3 {
        return Err(EncodeError::UnsupportedChannels(frame.channels()));
    }

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.write_image(
        frame.data(),
        frame.width(),
        frame.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_round_trips_dimensions() {
        let frame = Frame::new(vec![200u8; 32 * 24 * 3], 32, 24, 3, 0);
        let jpeg = encode_jpeg(&frame, 80).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 24);
    }

    #[test]
    fn test_encode_produces_jpeg_magic() {
        let frame = Frame::new(vec![0u8; 16 * 16 * 3], 16, 16, 3, 0);
        let jpeg = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_rejects_non_rgb() {
        let frame = Frame::new(vec![0u8; 8 * 8], 8, 8, 1, 0);
        assert!(matches!(
            encode_jpeg(&frame, 80),
            Err(EncodeError::UnsupportedChannels(1))
        ));
    }
}
