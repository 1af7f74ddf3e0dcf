use ndarray::ArrayView3;

use crate::shared::region::FaceRegion;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Frames are immutable once produced. Pipeline stages that need a
/// modified image (annotation, cropping) build a new `Frame` instead of
/// mutating the one they were handed, since the producer side may still
/// be holding it for publishing.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Sequence number assigned by the frame source.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Extracts the pixels under `region` as a new frame.
    ///
    /// Returns `None` when the region is empty or extends past the frame
    /// bounds; callers clamp first if partial crops are acceptable.
    pub fn crop(&self, region: &FaceRegion) -> Option<Frame> {
        if region.is_empty() {
            return None;
        }
        let (x, y) = (region.x as usize, region.y as usize);
        let (w, h) = (region.width as usize, region.height as usize);
        if x + w > self.width as usize || y + h > self.height as usize {
            return None;
        }

        let c = self.channels as usize;
        let src_stride = self.width as usize * c;
        let mut data = Vec::with_capacity(w * h * c);
        for row in y..y + h {
            let start = row * src_stride + x * c;
            data.extend_from_slice(&self.data[start..start + w * c]);
        }
        Some(Frame::new(data, w as u32, h as u32, self.channels, self.index))
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for row in 0..height {
            for col in 0..width {
                data.push(row as u8);
                data.push(col as u8);
                data.push(0);
            }
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape_and_pixel_access() {
        let frame = gradient_frame(4, 2);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
        assert_eq!(arr[[1, 3, 0]], 1); // row
        assert_eq!(arr[[1, 3, 1]], 3); // col
    }

    #[test]
    fn test_crop_extracts_subregion() {
        let frame = gradient_frame(8, 8);
        let region = FaceRegion::new(2, 3, 4, 2);
        let crop = frame.crop(&region).unwrap();

        assert_eq!(crop.width(), 4);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.index(), frame.index());

        let arr = crop.as_ndarray();
        // Top-left of crop = frame pixel (row 3, col 2)
        assert_eq!(arr[[0, 0, 0]], 3);
        assert_eq!(arr[[0, 0, 1]], 2);
        // Bottom-right of crop = frame pixel (row 4, col 5)
        assert_eq!(arr[[1, 3, 0]], 4);
        assert_eq!(arr[[1, 3, 1]], 5);
    }

    #[test]
    fn test_crop_zero_area_returns_none() {
        let frame = gradient_frame(8, 8);
        assert!(frame.crop(&FaceRegion::new(1, 1, 0, 5)).is_none());
        assert!(frame.crop(&FaceRegion::new(1, 1, 5, 0)).is_none());
    }

    #[test]
    fn test_crop_out_of_bounds_returns_none() {
        let frame = gradient_frame(8, 8);
        assert!(frame.crop(&FaceRegion::new(6, 0, 4, 4)).is_none());
        assert!(frame.crop(&FaceRegion::new(0, 6, 4, 4)).is_none());
    }

    #[test]
    fn test_crop_full_frame() {
        let frame = gradient_frame(4, 4);
        let crop = frame.crop(&FaceRegion::new(0, 0, 4, 4)).unwrap();
        assert_eq!(crop.data(), frame.data());
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = gradient_frame(2, 2);
        let cloned = frame.clone();
        assert_eq!(frame.data(), cloned.data());
        drop(frame);
        assert_eq!(cloned.width(), 2);
    }
}
