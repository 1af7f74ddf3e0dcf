use std::collections::VecDeque;
use std::sync::Mutex;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::shared::constants::{HISTORY_CAPACITY, RECENT_HISTORY_LIMIT};
use crate::shared::emotion::Emotion;
use crate::shared::prediction::Prediction;

/// Per-category running totals, serialized as a label-keyed map in the
/// fixed category order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmotionCounts(pub [u64; Emotion::COUNT]);

impl EmotionCounts {
    pub fn get(&self, emotion: Emotion) -> u64 {
        self.0[emotion.index()]
    }

    pub fn sum(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl Serialize for EmotionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::COUNT))?;
        for emotion in Emotion::ALL {
            map.serialize_entry(emotion.label(), &self.0[emotion.index()])?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub label: Emotion,
    pub confidence: f32,
    pub timestamp_ms: u64,
}

/// Point-in-time copy of the aggregate state. `recent` holds the newest
/// history entries, oldest first.
#[derive(Clone, Debug, Serialize)]
pub struct StatsSnapshot {
    pub counts: EmotionCounts,
    pub total: u64,
    pub recent: Vec<HistoryEntry>,
}

#[derive(Default)]
struct Inner {
    counts: EmotionCounts,
    total: u64,
    history: VecDeque<HistoryEntry>,
}

/// Thread-safe running tally of classifications.
///
/// Keeps per-category counts, a grand total, and a bounded history of
/// the most recent results. Every operation takes the one inner lock,
/// so updates, snapshots, and resets are each atomic with respect to
/// one another.
pub struct StatsAggregator {
    inner: Mutex<Inner>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Records one classification. The oldest history entry is evicted
    /// once the history is full.
    pub fn update(&self, prediction: &Prediction, timestamp_ms: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.counts.0[prediction.label.index()] += 1;
        inner.total += 1;
        if inner.history.len() == HISTORY_CAPACITY {
            inner.history.pop_front();
        }
        inner.history.push_back(HistoryEntry {
            label: prediction.label,
            confidence: prediction.confidence(),
            timestamp_ms,
        });
    }

    /// Copies out the current state with at most `limit` of the newest
    /// history entries, oldest first.
    pub fn snapshot(&self, limit: usize) -> StatsSnapshot {
        let inner = self.inner.lock().unwrap();
        let skip = inner.history.len().saturating_sub(limit);
        StatsSnapshot {
            counts: inner.counts,
            total: inner.total,
            recent: inner.history.iter().skip(skip).cloned().collect(),
        }
    }

    /// Snapshot with the default recent-history window.
    pub fn recent_snapshot(&self) -> StatsSnapshot {
        self.snapshot(RECENT_HISTORY_LIMIT)
    }

    /// Zeroes everything in one step. Concurrent readers see either the
    /// old state or the empty one, never a mix.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = Inner::default();
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
