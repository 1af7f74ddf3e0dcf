use crate::shared::emotion::Emotion;
use crate::shared::frame::Frame;
use crate::shared::prediction::Prediction;
use crate::shared::region::FaceRegion;

const BOX_COLOR: [u8; 3] = [40, 230, 90];
const BAR_FILL_WINNER: [u8; 3] = [40, 230, 90];
const BAR_FILL_OTHER: [u8; 3] = [120, 120, 230];
const BAR_BACKGROUND: [u8; 3] = [50, 50, 50];

const BOX_THICKNESS: u32 = 2;
const CONFIDENCE_STRIP_HEIGHT: u32 = 4;

const CHART_BAR_WIDTH: u32 = 120;
const CHART_BAR_HEIGHT: u32 = 8;
const CHART_BAR_GAP: u32 = 4;
const CHART_MARGIN: u32 = 10;

/// Draws detection results onto a copy of the frame.
///
/// Pure transform: the input frame is untouched and the same inputs
/// always produce the same output. Per face it draws a bounding box and
/// a confidence strip above it; the highest-confidence face also gets a
/// per-category score chart in the top-right corner, winner highlighted.
pub fn render(frame: &Frame, detections: &[(FaceRegion, Prediction)]) -> Frame {
    let mut canvas = Canvas {
        data: frame.data().to_vec(),
        width: frame.width(),
        height: frame.height(),
    };

    for (region, prediction) in detections {
        let region = region.clamped_to(frame.width(), frame.height());
        if region.is_empty() {
            continue;
        }
        canvas.stroke_rect(&region, BOX_THICKNESS, BOX_COLOR);
        draw_confidence_strip(&mut canvas, &region, prediction.confidence());
    }

    let top = detections.iter().max_by(|a, b| {
        a.1.confidence()
            .partial_cmp(&b.1.confidence())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some((_, prediction)) = top {
        draw_score_chart(&mut canvas, prediction);
    }

    Frame::new(
        canvas.data,
        frame.width(),
        frame.height(),
        frame.channels(),
        frame.index(),
    )
}

/// A filled bar above the box whose length tracks the confidence.
fn draw_confidence_strip(canvas: &mut Canvas, region: &FaceRegion, confidence: f32) {
    if region.y < CONFIDENCE_STRIP_HEIGHT + 1 {
        return;
    }
    let fill = (region.width as f32 * confidence.clamp(0.0, 1.0)) as u32;
    canvas.fill_rect(
        region.x,
        region.y - CONFIDENCE_STRIP_HEIGHT - 1,
        fill,
        CONFIDENCE_STRIP_HEIGHT,
        BOX_COLOR,
    );
}

/// One horizontal bar per category, anchored top-right.
fn draw_score_chart(canvas: &mut Canvas, prediction: &Prediction) {
    let chart_height =
        Emotion::COUNT as u32 * (CHART_BAR_HEIGHT + CHART_BAR_GAP) + 2 * CHART_MARGIN;
    if canvas.width < CHART_BAR_WIDTH + 2 * CHART_MARGIN || canvas.height < chart_height {
        return;
    }

    let x = canvas.width - CHART_BAR_WIDTH - CHART_MARGIN;
    for (i, emotion) in Emotion::ALL.iter().enumerate() {
        let y = CHART_MARGIN + i as u32 * (CHART_BAR_HEIGHT + CHART_BAR_GAP);
        canvas.fill_rect(x, y, CHART_BAR_WIDTH, CHART_BAR_HEIGHT, BAR_BACKGROUND);

        let score = prediction.scores[i].clamp(0.0, 1.0);
        let fill = (CHART_BAR_WIDTH as f32 * score) as u32;
        let color = if *emotion == prediction.label {
            BAR_FILL_WINNER
        } else {
            BAR_FILL_OTHER
        };
        canvas.fill_rect(x, y, fill, CHART_BAR_HEIGHT, color);
    }
}

struct Canvas {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        let x2 = (x + w).min(self.width);
        let y2 = (y + h).min(self.height);
        for row in y..y2 {
            for col in x..x2 {
                let offset = ((row * self.width + col) * 3) as usize;
                self.data[offset..offset + 3].copy_from_slice(&color);
            }
        }
    }

    fn stroke_rect(&mut self, region: &FaceRegion, thickness: u32, color: [u8; 3]) {
        let t = thickness.min(region.width).min(region.height);
        // top / bottom
        self.fill_rect(region.x, region.y, region.width, t, color);
        self.fill_rect(
            region.x,
            (region.y + region.height).saturating_sub(t),
            region.width,
            t,
            color,
        );
        // left / right
        self.fill_rect(region.x, region.y, t, region.height, color);
        self.fill_rect(
            (region.x + region.width).saturating_sub(t),
            region.y,
            t,
            region.height,
            color,
        );
    }
}
