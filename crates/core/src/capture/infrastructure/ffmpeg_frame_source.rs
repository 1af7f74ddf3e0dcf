use std::path::PathBuf;

use crate::capture::domain::frame_source::{CaptureError, FrameSource, SourceInfo};
use crate::shared::frame::Frame;

/// Frame source decoding a video file or stream URL via ffmpeg-next.
///
/// Every decoded frame is converted to tightly-packed RGB24 before being
/// handed to the pipeline; format details stay inside this adapter.
pub struct FfmpegFrameSource {
    input: PathBuf,
    session: Option<DecodeSession>,
}

// Safety: the source is owned by exactly one thread at a time (the
// controller hands it to the capture thread and gets it back on join).
// The raw pointers inside ffmpeg types are never shared.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            session: None,
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&mut self) -> Result<SourceInfo, CaptureError> {
        if let Some(ref session) = self.session {
            return Ok(session.info);
        }
        let session = DecodeSession::start(&self.input)?;
        let info = session.info;
        self.session = Some(session);
        Ok(info)
    }

    fn read(&mut self) -> Result<Frame, CaptureError> {
        match self.session.as_mut() {
            Some(session) => session.next_frame(),
            None => Err(CaptureError::NotOpen),
        }
    }

    fn release(&mut self) {
        self.session = None;
    }
}

/// Decoder state alive between `open` and `release`.
struct DecodeSession {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    info: SourceInfo,
    next_index: usize,
    flushing: bool,
}

impl DecodeSession {
    fn start(input: &std::path::Path) -> Result<Self, CaptureError> {
        ffmpeg_next::init().map_err(|e| CaptureError::Open(e.to_string()))?;

        let ictx = ffmpeg_next::format::input(input)
            .map_err(|e| CaptureError::Open(format!("{}: {e}", input.display())))?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| CaptureError::Open("no video stream found".into()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| CaptureError::Open(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| CaptureError::Open(e.to_string()))?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| CaptureError::Open(e.to_string()))?;

        Ok(Self {
            ictx,
            decoder,
            scaler,
            stream_index,
            info: SourceInfo { width, height, fps },
            next_index: 0,
            flushing: false,
        })
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureError> {
        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(frame);
            }
            if self.flushing {
                return Err(CaptureError::EndOfStream);
            }

            match self.ictx.packets().next() {
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    // A rejected packet is a decode hiccup, not a session
                    // failure; skip it and keep pulling.
                    let _ = self.decoder.send_packet(&packet);
                }
            }
        }
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb)
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let pixels = strip_stride(&rgb, self.info.width, self.info.height);
        let frame = Frame::new(pixels, self.info.width, self.info.height, 3, self.next_index);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Copies ffmpeg's row-padded pixel data into a tight RGB buffer.
fn strip_stride(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Encodes `num_frames` flat gray MPEG4 frames into `path`.
    fn write_test_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        ffmpeg_next::init().unwrap();

        let fps = 25;
        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        for i in 0..num_frames {
            let mut yuv = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::YUV420P,
                width,
                height,
            );
            let luma = ((i * 30) % 200 + 30) as u8;
            for plane in 0..3 {
                let value = if plane == 0 { luma } else { 128 };
                for byte in yuv.data_mut(plane).iter_mut() {
                    *byte = value;
                }
            }
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            drain_packets(&mut encoder, &mut octx, ost_time_base, fps);
        }

        encoder.send_eof().unwrap();
        drain_packets(&mut encoder, &mut octx, ost_time_base, fps);
        octx.write_trailer().unwrap();
    }

    fn drain_packets(
        encoder: &mut ffmpeg_next::encoder::Video,
        octx: &mut ffmpeg_next::format::context::Output,
        ost_time_base: ffmpeg_next::Rational,
        fps: i32,
    ) {
        let mut packet = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            packet.write_interleaved(octx).unwrap();
        }
    }

    #[test]
    fn test_open_returns_source_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_test_video(&path, 3, 160, 120);

        let mut source = FfmpegFrameSource::new(&path);
        let info = source.open().unwrap();
        assert_eq!(info.width, 160);
        assert_eq!(info.height, 120);
        assert!(info.fps > 0.0);
    }

    #[test]
    fn test_open_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_test_video(&path, 3, 160, 120);

        let mut source = FfmpegFrameSource::new(&path);
        let first = source.open().unwrap();
        let second = source.open().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let mut source = FfmpegFrameSource::new("/nonexistent/clip.mp4");
        assert!(matches!(source.open(), Err(CaptureError::Open(_))));
    }

    #[test]
    fn test_read_before_open_fails() {
        let mut source = FfmpegFrameSource::new("/tmp/irrelevant.mp4");
        assert!(matches!(source.read(), Err(CaptureError::NotOpen)));
    }

    #[test]
    fn test_read_yields_sequential_rgb_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_test_video(&path, 4, 160, 120);

        let mut source = FfmpegFrameSource::new(&path);
        source.open().unwrap();

        for expected_index in 0..4 {
            let frame = source.read().unwrap();
            assert_eq!(frame.index(), expected_index);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
    }

    #[test]
    fn test_read_past_end_reports_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_test_video(&path, 2, 160, 120);

        let mut source = FfmpegFrameSource::new(&path);
        source.open().unwrap();
        while source.read().is_ok() {}
        assert!(matches!(source.read(), Err(CaptureError::EndOfStream)));
    }

    #[test]
    fn test_release_is_idempotent_and_reopenable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        write_test_video(&path, 2, 160, 120);

        let mut source = FfmpegFrameSource::new(&path);
        source.open().unwrap();
        source.release();
        source.release();
        assert!(matches!(source.read(), Err(CaptureError::NotOpen)));

        // A released source can start a fresh session from frame zero.
        source.open().unwrap();
        assert_eq!(source.read().unwrap().index(), 0);
    }
}
