//! Frame source decoding a video file with FFmpeg.
//!
//! Only built with the `video` feature, which needs the FFmpeg libraries on
//! the system. Frames come out in decode order, converted to packed RGB24.

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{Context as Scaler, Flags};
use tracing::{debug, warn};

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::frames::source::FrameSource;
use crate::tomo_pipeline::frames::types::RawFrame;

/// Open demuxer, decoder and RGB converter. Dropping it closes the file.
struct OpenVideo {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::decoder::Video,
    scaler: Scaler,
    width: u32,
    height: u32,
    input_drained: bool,
}

fn open_error(path: &Path, what: &str, e: impl std::fmt::Display) -> PipelineError {
    PipelineError::SourceOpen(format!("{}: {}: {}", path.display(), what, e))
}

impl OpenVideo {
    fn open(path: &Path) -> Result<Self> {
        ffmpeg::init().map_err(|e| open_error(path, "ffmpeg init", e))?;
        let input = ffmpeg::format::input(path).map_err(|e| open_error(path, "cannot open", e))?;

        let (stream_index, context) = {
            let stream = input
                .streams()
                .best(ffmpeg::media::Type::Video)
                .ok_or_else(|| open_error(path, "no video stream", "none found"))?;
            let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| open_error(path, "codec parameters", e))?;
            (stream.index(), context)
        };
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| open_error(path, "decoder", e))?;

        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(open_error(path, "invalid frame size", format!("{width}x{height}")));
        }
        let scaler = Scaler::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(|e| open_error(path, "scaler", e))?;

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            width,
            height,
            input_drained: false,
        })
    }

    /// Feeds the next packet of the video stream, or end-of-stream once the
    /// container is exhausted.
    fn feed(&mut self) -> Result<()> {
        while let Some((stream, packet)) = self.input.packets().next() {
            if stream.index() == self.stream_index {
                return self
                    .decoder
                    .send_packet(&packet)
                    .map_err(|e| PipelineError::FrameRead(format!("decode: {e}")));
            }
        }
        self.input_drained = true;
        self.decoder
            .send_eof()
            .map_err(|e| PipelineError::FrameRead(format!("decode: {e}")))
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return self.to_rgb(&decoded).map(Some),
                Err(ffmpeg::Error::Other {
                    errno: ffmpeg::error::EAGAIN,
                }) if !self.input_drained => self.feed()?,
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other {
                    errno: ffmpeg::error::EAGAIN,
                }) => return Ok(None),
                Err(e) => return Err(PipelineError::FrameRead(format!("decode: {e}"))),
            }
        }
    }

    fn to_rgb(&mut self, decoded: &ffmpeg::frame::Video) -> Result<RawFrame> {
        if decoded.width() != self.width || decoded.height() != self.height {
            return Err(PipelineError::FrameRead(format!(
                "frame size changed from {}x{} to {}x{}",
                self.width,
                self.height,
                decoded.width(),
                decoded.height()
            )));
        }

        let mut rgb = ffmpeg::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .map_err(|e| PipelineError::FrameRead(format!("rgb conversion: {e}")))?;

        let data = rgb.data(0);
        let stride = rgb.stride(0);
        let row = self.width as usize * 3;
        let mut pixels = Vec::with_capacity(row * self.height as usize);
        for y in 0..self.height as usize {
            let line = data
                .get(y * stride..y * stride + row)
                .ok_or_else(|| PipelineError::FrameRead(format!("short rgb plane at row {y}")))?;
            pixels.extend_from_slice(line);
        }

        RawFrame::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| PipelineError::FrameRead("rgb buffer size mismatch".to_string()))
    }
}

/// Reads frames straight from a video file, one decoded frame per `read_frame`.
pub struct VideoFileSource {
    path: PathBuf,
    video: Option<OpenVideo>,
    frames_read: usize,
}

impl VideoFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            video: None,
            frames_read: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// `(width, height)` of the decoded frames while the source is open.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.video.as_ref().map(|v| (v.width, v.height))
    }
}

impl FrameSource for VideoFileSource {
    fn open(&mut self) -> Result<()> {
        if self.video.is_some() {
            warn!("{} reopened without release", self.path.display());
        }
        let video = OpenVideo::open(&self.path)?;
        debug!(
            width = video.width,
            height = video.height,
            "Opened video {}",
            self.path.display()
        );
        self.video = Some(video);
        self.frames_read = 0;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        let video = self.video.as_mut().ok_or_else(|| {
            PipelineError::FrameRead(format!("{} is not open", self.path.display()))
        })?;
        let frame = video.next_frame()?;
        if frame.is_some() {
            self.frames_read += 1;
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if self.video.take().is_some() {
            debug!(frames = self.frames_read, "Closed video {}", self.path.display());
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
