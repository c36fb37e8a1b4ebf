use std::collections::VecDeque;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::frames::source::FrameSource;
use crate::tomo_pipeline::frames::types::RawFrame;

/// Frame source over frames that are already in memory.
///
/// Like a decode stream it is not restartable: frames handed out are gone.
pub struct MemoryFrameSource {
    frames: VecDeque<RawFrame>,
    opened: bool,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self {
            frames: frames.into(),
            opened: false,
        }
    }

    /// `count` frames of a single gray level, handy for calibration runs.
    pub fn uniform(width: u32, height: u32, value: u8, count: usize) -> Self {
        let frame = RawFrame::from_pixel(width, height, image::Rgb([value, value, value]));
        Self::new(vec![frame; count])
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemoryFrameSource {
    fn open(&mut self) -> Result<()> {
        self.opened = true;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if !self.opened {
            return Err(PipelineError::FrameRead("memory source is not open".to_string()));
        }
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.opened = false;
    }

    fn describe(&self) -> String {
        format!("in-memory ({} frames remaining)", self.frames.len())
    }
}
