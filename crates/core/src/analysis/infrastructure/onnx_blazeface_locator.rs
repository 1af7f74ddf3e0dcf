use std::path::Path;

use crate::analysis::domain::face_locator::{FaceLocator, LocateError};
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// BlazeFace model input resolution (short-range variant).
const INPUT_SIZE: u32 = 128;

/// Anchor count for the short-range model: 16x16x2 + 8x8x6.
const NUM_ANCHORS: usize = 896;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.3;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Face locator backed by a BlazeFace ONNX Runtime session.
///
/// Lightweight and fast enough to run every frame of a live stream;
/// emits bounding boxes only, clamped to the frame.
pub struct OnnxBlazefaceLocator {
    session: ort::session::Session,
    confidence: f32,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceLocator {
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, LocateError> {
        let session = ort::session::Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| LocateError::Inference(e.to_string()))?;
        Ok(Self {
            session,
            confidence,
            anchors: anchor_centers(),
        })
    }
}

impl FaceLocator for OnnxBlazefaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, LocateError> {
        let tensor = preprocess(frame, INPUT_SIZE);
        let input = ort::value::Tensor::from_array(tensor)
            .map_err(|e| LocateError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| LocateError::Inference(e.to_string()))?;

        // BlazeFace emits box regressors [1, 896, 16] and raw confidence
        // logits [1, 896, 1].
        if outputs.len() < 2 {
            return Err(LocateError::Inference(format!(
                "expected 2 model outputs, got {}",
                outputs.len()
            )));
        }
        let regressors = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| LocateError::Inference(e.to_string()))?;
        let logits = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| LocateError::Inference(e.to_string()))?;
        let reg = regressors
            .as_slice()
            .ok_or_else(|| LocateError::Inference("non-contiguous regressor output".into()))?;
        let scores = logits
            .as_slice()
            .ok_or_else(|| LocateError::Inference("non-contiguous score output".into()))?;

        let reg = reg.to_vec();
        let scores = scores.to_vec();
        drop(outputs);

        let candidates = self.decode(&reg, &scores, frame.width(), frame.height());
        let kept = non_max_suppression(candidates, NMS_IOU_THRESH);

        Ok(kept
            .into_iter()
            .map(|b| b.to_region(frame.width(), frame.height()))
            .collect())
    }
}

impl OnnxBlazefaceLocator {
    /// Decodes anchor-relative box deltas into frame-space candidates,
    /// dropping anything under the confidence threshold.
    fn decode(&self, reg: &[f32], scores: &[f32], frame_w: u32, frame_h: u32) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let count = self.anchors.len().min(NUM_ANCHORS).min(scores.len());

        for i in 0..count {
            let score = sigmoid(scores[i]);
            if score < self.confidence {
                continue;
            }
            let offset = i * 16;
            if offset + 4 > reg.len() {
                break;
            }

            let [ax, ay] = self.anchors[i];
            let cx = ax + reg[offset] / INPUT_SIZE as f32;
            let cy = ay + reg[offset + 1] / INPUT_SIZE as f32;
            let w = reg[offset + 2] / INPUT_SIZE as f32;
            let h = reg[offset + 3] / INPUT_SIZE as f32;

            candidates.push(Candidate {
                x1: (cx - w / 2.0) * frame_w as f32,
                y1: (cy - h / 2.0) * frame_h as f32,
                x2: (cx + w / 2.0) * frame_w as f32,
                y2: (cy + h / 2.0) * frame_h as f32,
                score,
            });
        }
        candidates
    }
}

/// Resize to `size` x `size`, scale to [0,1], NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let (src_h, src_w) = (frame.height() as usize, frame.width() as usize);
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));
    for y in 0..s {
        let sy = (((y as f32 + 0.5) * src_h as f32 / s as f32) as usize).min(src_h - 1);
        for x in 0..s {
            let sx = (((x as f32 + 0.5) * src_w as f32 / s as f32) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[sy, sx, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

/// Anchor centers for the short-range model, in normalized coordinates.
fn anchor_centers() -> Vec<[f32; 2]> {
    let layers = [(8usize, 2usize), (16, 6)]; // (stride, anchors per cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for (stride, per_cell) in layers {
        let grid = INPUT_SIZE as usize / stride;
        for y in 0..grid {
            for x in 0..grid {
                let cx = (x as f32 + 0.5) / grid as f32;
                let cy = (y as f32 + 0.5) / grid as f32;
                anchors.extend(std::iter::repeat([cx, cy]).take(per_cell));
            }
        }
    }
    anchors
}

#[derive(Clone, Debug)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

impl Candidate {
    fn to_region(&self, frame_w: u32, frame_h: u32) -> FaceRegion {
        let x = self.x1.max(0.0) as u32;
        let y = self.y1.max(0.0) as u32;
        let w = (self.x2.max(0.0) as u32).saturating_sub(x);
        let h = (self.y2.max(0.0) as u32).saturating_sub(y);
        FaceRegion::new(x, y, w, h).clamped_to(frame_w, frame_h)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area_a = (self.x2 - self.x1) * (self.y2 - self.y1);
        let area_b = (other.x2 - other.x1) * (other.y2 - other.y1);
        inter / (area_a + area_b - inter)
    }
}

/// Greedy NMS: highest score wins, overlapping candidates are dropped.
fn non_max_suppression(mut candidates: Vec<Candidate>, iou_thresh: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_thresh) {
            kept.push(candidate);
        }
    }
    kept
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
