use image::imageops;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::CropRegion;
use crate::tomo_pipeline::frames::source::FrameSource;
use crate::tomo_pipeline::frames::types::RawFrame;

/// Cuts the same square region out of every frame of the inner source.
pub struct CroppedSource<S: FrameSource> {
    inner: S,
    region: CropRegion,
}

impl<S: FrameSource> CroppedSource<S> {
    pub fn new(inner: S, region: CropRegion) -> Self {
        Self { inner, region }
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSource> FrameSource for CroppedSource<S> {
    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        let Some(frame) = self.inner.read_frame()? else {
            return Ok(None);
        };

        let CropRegion { x, y, size } = self.region;
        let (width, height) = frame.dimensions();
        let fits = u64::from(x) + u64::from(size) <= u64::from(width)
            && u64::from(y) + u64::from(size) <= u64::from(height);
        if !fits {
            return Err(PipelineError::FrameRead(format!(
                "crop {size}x{size} at ({x}, {y}) exceeds {width}x{height} frame"
            )));
        }

        Ok(Some(imageops::crop_imm(&frame, x, y, size, size).to_image()))
    }

    fn release(&mut self) {
        self.inner.release();
    }

    fn describe(&self) -> String {
        let CropRegion { x, y, size } = self.region;
        format!("{} cropped to {size}x{size} at ({x}, {y})", self.inner.describe())
    }
}
