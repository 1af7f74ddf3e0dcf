use serde::Serialize;

use crate::shared::emotion::Emotion;

/// One classification result for one face region.
///
/// Carries the winning label plus the full score vector in category
/// order. Scores are probability-like ([0, 1]) but are only compared,
/// never required to sum to 1.
#[derive(Clone, Debug, Serialize)]
pub struct Prediction {
    pub label: Emotion,
    pub scores: [f32; Emotion::COUNT],
}

impl Prediction {
    /// Builds a prediction by selecting the highest-scoring category.
    ///
    /// Ties resolve to the earliest category in declaration order.
    pub fn from_scores(scores: [f32; Emotion::COUNT]) -> Self {
        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }
        Self {
            // best is always a valid index into ALL
            label: Emotion::ALL[best],
            scores,
        }
    }

    /// The winning category's score.
    pub fn confidence(&self) -> f32 {
        self.scores[self.label.index()]
    }
}
