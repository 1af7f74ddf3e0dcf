use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::analysis::domain::emotion_classifier::EmotionClassifier;
use crate::analysis::domain::face_locator::FaceLocator;
use crate::annotate::annotator;
use crate::broadcast::broadcaster::{Broadcaster, Subscription};
use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::pipeline::frame_packet::{FaceResult, FramePacket};
use crate::pipeline::session_state::SessionState;
use crate::shared::constants::JPEG_QUALITY;
use crate::shared::encode;
use crate::stats::stats_aggregator::{StatsAggregator, StatsSnapshot};

/// The three processing stages a session runs frames through.
///
/// Owned by the capture loop while a session runs and handed back to
/// the controller when it ends, so a stopped controller can start a new
/// session with the same device and models.
pub struct PipelineStages {
    pub source: Box<dyn FrameSource>,
    pub locator: Box<dyn FaceLocator>,
    pub classifier: Box<dyn EmotionClassifier>,
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("a session is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Device(#[from] CaptureError),
}

struct Control {
    state: SessionState,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Owns the session lifecycle and the fan-out of results.
///
/// `start` acquires the device and spawns the capture loop; `stop`
/// requests a cooperative shutdown and waits for the loop to release
/// the device. Per-face failures inside the loop are logged and
/// skipped; a failing device ends the session and the controller goes
/// back to idle on its own.
pub struct PipelineController {
    control: Arc<Mutex<Control>>,
    idle_stages: Arc<Mutex<Option<PipelineStages>>>,
    stats: Arc<StatsAggregator>,
    frames: Broadcaster<FramePacket>,
    stats_feed: Broadcaster<StatsSnapshot>,
    jpeg_quality: u8,
}

impl PipelineController {
    pub fn new(stages: PipelineStages) -> Self {
        Self::with_jpeg_quality(stages, JPEG_QUALITY)
    }

    pub fn with_jpeg_quality(stages: PipelineStages, jpeg_quality: u8) -> Self {
        Self {
            control: Arc::new(Mutex::new(Control {
                state: SessionState::Idle,
                stop: Arc::new(AtomicBool::new(false)),
                worker: None,
            })),
            idle_stages: Arc::new(Mutex::new(Some(stages))),
            stats: Arc::new(StatsAggregator::new()),
            frames: Broadcaster::new(),
            stats_feed: Broadcaster::new(),
            jpeg_quality,
        }
    }

    /// Opens the device and spawns the capture loop.
    ///
    /// Device acquisition happens on the caller's thread so an
    /// unavailable device is reported synchronously and the controller
    /// stays idle.
    pub fn start(&self) -> Result<(), ControlError> {
        let mut control = self.control.lock().unwrap();
        if control.state != SessionState::Idle {
            return Err(ControlError::AlreadyRunning);
        }
        // A session that ended on its own leaves a finished handle.
        if let Some(stale) = control.worker.take() {
            let _ = stale.join();
        }

        let mut stages = self
            .idle_stages
            .lock()
            .unwrap()
            .take()
            .ok_or(ControlError::AlreadyRunning)?;
        let info = match stages.source.open() {
            Ok(info) => info,
            Err(e) => {
                *self.idle_stages.lock().unwrap() = Some(stages);
                return Err(ControlError::Device(e));
            }
        };
        log::info!(
            "capture opened: {}x{} at {:.1} fps",
            info.width,
            info.height,
            info.fps
        );

        control.stop = Arc::new(AtomicBool::new(false));
        let feeds = Feeds {
            stop: Arc::clone(&control.stop),
            control: Arc::clone(&self.control),
            idle_stages: Arc::clone(&self.idle_stages),
            stats: Arc::clone(&self.stats),
            frames: self.frames.clone(),
            stats_feed: self.stats_feed.clone(),
            jpeg_quality: self.jpeg_quality,
        };
        control.worker = Some(std::thread::spawn(move || capture_loop(stages, feeds)));
        control.state = SessionState::Running;
        Ok(())
    }

    /// Requests shutdown and waits for the capture loop to finish.
    /// A no-op when no session is running.
    pub fn stop(&self) {
        let handle = {
            let mut control = self.control.lock().unwrap();
            if control.state != SessionState::Running {
                return;
            }
            control.state = SessionState::Stopping;
            control.stop.store(true, Ordering::Relaxed);
            control.worker.take()
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("capture worker panicked");
            }
        }
        // The loop flips to idle itself on a clean exit; this covers a
        // panicked worker.
        self.control.lock().unwrap().state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.control.lock().unwrap().state
    }

    /// Zeroes the aggregate stats and pushes the empty snapshot so
    /// consumers see the reset immediately.
    pub fn reset_stats(&self) {
        self.stats.reset();
        self.stats_feed.publish(self.stats.recent_snapshot());
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.recent_snapshot()
    }

    pub fn latest_frame(&self) -> Option<Arc<FramePacket>> {
        self.frames.latest()
    }

    pub fn subscribe_frames(&self) -> Subscription<FramePacket> {
        self.frames.subscribe()
    }

    pub fn subscribe_stats(&self) -> Subscription<StatsSnapshot> {
        self.stats_feed.subscribe()
    }
}

struct Feeds {
    stop: Arc<AtomicBool>,
    control: Arc<Mutex<Control>>,
    idle_stages: Arc<Mutex<Option<PipelineStages>>>,
    stats: Arc<StatsAggregator>,
    frames: Broadcaster<FramePacket>,
    stats_feed: Broadcaster<StatsSnapshot>,
    jpeg_quality: u8,
}

/// Reads, analyzes, and publishes frames until stopped or the source
/// fails. Always releases the device exactly once on the way out.
fn capture_loop(mut stages: PipelineStages, feeds: Feeds) {
    while !feeds.stop.load(Ordering::Relaxed) {
        let frame = match stages.source.read() {
            Ok(frame) => frame,
            Err(CaptureError::EndOfStream) => {
                log::info!("capture source ended");
                break;
            }
            Err(e) => {
                log::error!("capture failed, ending session: {e}");
                break;
            }
        };
        let timestamp_ms = now_ms();

        let regions = match stages.locator.locate(&frame) {
            Ok(regions) => regions,
            Err(e) => {
                log::warn!("face location failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };

        let mut faces = Vec::with_capacity(regions.len());
        for region in regions {
            let Some(crop) = frame.crop(&region) else {
                continue;
            };
            match stages.classifier.classify(&crop) {
                Ok(prediction) => faces.push(FaceResult { region, prediction }),
                Err(e) => log::warn!(
                    "classification failed for face at ({}, {}): {e}",
                    region.x,
                    region.y
                ),
            }
        }

        if !faces.is_empty() {
            for face in &faces {
                feeds.stats.update(&face.prediction, timestamp_ms);
            }
            feeds.stats_feed.publish(feeds.stats.recent_snapshot());
        }

        let detections: Vec<_> = faces
            .iter()
            .map(|f| (f.region, f.prediction.clone()))
            .collect();
        let annotated = annotator::render(&frame, &detections);
        let jpeg = match encode::encode_jpeg(&annotated, feeds.jpeg_quality) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("jpeg encode failed on frame {}: {e}", frame.index());
                Vec::new()
            }
        };

        feeds.frames.publish(FramePacket {
            index: frame.index() as u64,
            timestamp_ms,
            faces,
            jpeg,
        });
    }

    stages.source.release();
    *feeds.idle_stages.lock().unwrap() = Some(stages);
    feeds.control.lock().unwrap().state = SessionState::Idle;
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
