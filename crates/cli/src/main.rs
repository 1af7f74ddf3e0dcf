use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::{select, tick};

use moodcam_core::analysis::infrastructure::model_resolver;
use moodcam_core::analysis::infrastructure::onnx_blazeface_locator::OnnxBlazefaceLocator;
use moodcam_core::analysis::infrastructure::onnx_emotion_classifier::OnnxEmotionClassifier;
use moodcam_core::capture::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use moodcam_core::pipeline::controller::{PipelineController, PipelineStages};
use moodcam_core::pipeline::frame_packet::FramePacket;
use moodcam_core::pipeline::session_state::SessionState;
use moodcam_core::shared::constants::{
    EMOTION_MODEL_NAME, EMOTION_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
};
use moodcam_core::shared::emotion::Emotion;
use moodcam_core::stats::stats_aggregator::StatsSnapshot;

/// Live face emotion analysis for videos and capture devices.
#[derive(Parser)]
#[command(name = "moodcam")]
struct Cli {
    /// Input video file or capture device path.
    input: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f32,

    /// JPEG quality for published frames (1-100).
    #[arg(long, default_value = "80")]
    jpeg_quality: u8,

    /// Stop after this many seconds (default: run until the source ends).
    #[arg(long)]
    duration: Option<u64>,

    /// Seconds between printed stats summaries (0 disables them).
    #[arg(long, default_value = "2")]
    stats_interval: u64,

    /// Write the last annotated frame to this file on exit.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Directory with pre-downloaded model files.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let controller = build_controller(&cli)?;
    let mut frames = controller.subscribe_frames();
    let mut stats_feed = controller.subscribe_stats();

    controller.start()?;
    log::info!("Analyzing {}", cli.input.display());

    let deadline = cli.duration.map(|s| Instant::now() + Duration::from_secs(s));
    let poll = tick(Duration::from_millis(50));
    let stats_tick = tick(if cli.stats_interval > 0 {
        Duration::from_secs(cli.stats_interval)
    } else {
        // Effectively never fires.
        Duration::from_secs(60 * 60 * 24 * 365)
    });

    let mut last_packet: Option<Arc<FramePacket>> = None;
    let mut frames_seen: u64 = 0;
    loop {
        select! {
            recv(poll) -> _ => {
                if let Some(packet) = frames.poll() {
                    frames_seen += 1;
                    last_packet = Some(packet);
                }
                if controller.state() == SessionState::Idle {
                    break;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break;
                }
            }
            recv(stats_tick) -> _ => {
                if let Some(snap) = stats_feed.poll() {
                    print_stats_line(&snap);
                }
            }
        }
    }
    controller.stop();

    // Catch anything published between the last poll and the stop.
    if let Some(packet) = frames.poll() {
        frames_seen += 1;
        last_packet = Some(packet);
    }

    print_summary(frames_seen, &controller.stats_snapshot());

    if let Some(path) = cli.snapshot {
        match last_packet {
            Some(packet) if !packet.jpeg.is_empty() => {
                std::fs::write(&path, &packet.jpeg)?;
                log::info!("Snapshot written to {}", path.display());
            }
            _ => log::warn!("No frame available for snapshot"),
        }
    }

    Ok(())
}

fn build_controller(cli: &Cli) -> Result<PipelineController, Box<dyn std::error::Error>> {
    let bundled = cli.model_dir.as_deref();

    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let face_model = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        bundled,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    log::info!("Resolving model: {EMOTION_MODEL_NAME}");
    let emotion_model = model_resolver::resolve(
        EMOTION_MODEL_NAME,
        EMOTION_MODEL_URL,
        bundled,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let stages = PipelineStages {
        source: Box::new(FfmpegFrameSource::new(&cli.input)),
        locator: Box::new(OnnxBlazefaceLocator::new(&face_model, cli.confidence)?),
        classifier: Box::new(OnnxEmotionClassifier::new(&emotion_model)?),
    };
    Ok(PipelineController::with_jpeg_quality(
        stages,
        cli.jpeg_quality,
    ))
}

fn print_stats_line(snap: &StatsSnapshot) {
    let dominant = Emotion::ALL
        .iter()
        .max_by_key(|e| snap.counts.get(**e))
        .copied()
        .unwrap_or(Emotion::Neutral);
    eprintln!(
        "faces analyzed: {}, dominant: {} ({})",
        snap.total,
        dominant,
        snap.counts.get(dominant)
    );
}

fn print_summary(frames_seen: u64, snap: &StatsSnapshot) {
    println!("Frames processed: {frames_seen}");
    println!("Faces analyzed:   {}", snap.total);
    for emotion in Emotion::ALL {
        let count = snap.counts.get(emotion);
        if count > 0 {
            println!("  {emotion}: {count}");
        }
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.jpeg_quality == 0 || cli.jpeg_quality > 100 {
        return Err(format!(
            "JPEG quality must be between 1 and 100, got {}",
            cli.jpeg_quality
        )
        .into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
