use std::io::{Cursor, Write};

use ndarray::Axis;
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tracing::debug;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::TiffCompression;
use crate::tomo_pipeline::export::writer::VolumeWriter;
use crate::tomo_pipeline::reconstruction::Volume;

/// Multi-page 32-bit float TIFF, one page per slice along the first axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffVolumeWriter {
    compression: TiffCompression,
}

impl TiffVolumeWriter {
    pub fn new(compression: TiffCompression) -> Self {
        Self { compression }
    }

    fn encoder_compression(&self) -> Compression {
        match self.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        }
    }
}

impl VolumeWriter for TiffVolumeWriter {
    fn extension(&self) -> &'static str {
        "tiff"
    }

    fn write_volume(&self, volume: &Volume, output: &mut dyn Write) -> Result<()> {
        let (pages, height, width) = volume.shape();
        if volume.is_empty() {
            return Err(PipelineError::InvalidDimensions(width, height));
        }
        debug!(pages, width, height, compression = ?self.compression, "Encoding TIFF volume");

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| PipelineError::EncodeError(e.to_string()))?
            .with_compression(self.encoder_compression());

        for slice in volume.as_array().axis_iter(Axis(0)) {
            let pixels: Vec<f32> = slice.iter().copied().collect();
            encoder
                .write_image::<Gray32Float>(width as u32, height as u32, &pixels)
                .map_err(|e| PipelineError::EncodeError(e.to_string()))?;
        }
        drop(encoder);

        output.write_all(&buffer)?;
        debug!(bytes = buffer.len(), "TIFF encoding complete");
        Ok(())
    }
}
