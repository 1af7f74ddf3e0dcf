use serde::Serialize;

/// An axis-aligned face bounding box in frame coordinates.
///
/// Produced fresh by the locator for every frame; carries no identity
/// across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersects the region with a `frame_w` x `frame_h` frame.
    ///
    /// A region entirely outside the frame collapses to zero size.
    pub fn clamped_to(&self, frame_w: u32, frame_h: u32) -> FaceRegion {
        let x = self.x.min(frame_w);
        let y = self.y.min(frame_h);
        FaceRegion {
            x,
            y,
            width: self.width.min(frame_w - x),
            height: self.height.min(frame_h - y),
        }
    }
}
