//! Raw frame to calibrated projection.
//!
//! The order of the steps is fixed: luminance, rotate 90° clockwise so the
//! turntable axis becomes the vertical detector axis, resample to the detector
//! size, then map intensity to attenuation with `-ln((v + 1) / 256)`. The `+1`
//! keeps fully dark pixels finite and the `/256` makes a saturated pixel exactly
//! zero attenuation.

use image::GrayImage;
use image::imageops::{self, FilterType};
use ndarray::Array2;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::frames::types::{Projection, RawFrame};

/// Attenuation for one 8-bit intensity.
pub fn attenuation(value: u8) -> f32 {
    (-((f64::from(value) + 1.0) / 256.0).ln()) as f32
}

/// BT.601 luma in 14-bit fixed point, rounded: `0.299 R + 0.587 G + 0.114 B`.
pub fn luma(pixel: image::Rgb<u8>) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    let [r, g, b] = pixel.0;
    ((u32::from(r) * R + u32::from(g) * G + u32::from(b) * B + (1 << 13)) >> 14) as u8
}

/// Single-channel luminance of a colour frame.
pub fn luminance(frame: &RawFrame) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        image::Luma([luma(*frame.get_pixel(x, y))])
    })
}

#[derive(Debug, Clone)]
pub struct FrameTransformer {
    target_size: u32,
    lut: [f32; 256],
}

impl FrameTransformer {
    pub fn new(target_size: u32) -> Self {
        let mut lut = [0.0f32; 256];
        for (value, slot) in lut.iter_mut().enumerate() {
            *slot = attenuation(value as u8);
        }
        Self { target_size, lut }
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    pub fn transform(&self, frame: &RawFrame) -> Result<Projection> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 || self.target_size == 0 {
            return Err(PipelineError::InvalidDimensions(width as usize, height as usize));
        }

        let gray = luminance(frame);
        let rotated = imageops::rotate90(&gray);
        let resized = imageops::resize(&rotated, self.target_size, self.target_size, FilterType::Triangle);

        let size = self.target_size as usize;
        Ok(Array2::from_shape_fn((size, size), |(row, col)| {
            self.lut[resized.get_pixel(col as u32, row as u32)[0] as usize]
        }))
    }
}
