use std::io::Write;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::export::npy;
use crate::tomo_pipeline::export::writer::VolumeWriter;
use crate::tomo_pipeline::reconstruction::Volume;

/// Raw volume as a NumPy `.npy` array of `float32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyVolumeWriter;

impl VolumeWriter for NpyVolumeWriter {
    fn extension(&self) -> &'static str {
        "npy"
    }

    fn write_volume(&self, volume: &Volume, output: &mut dyn Write) -> Result<()> {
        let (d0, d1, d2) = volume.shape();
        npy::write_array(output, &[d0, d1, d2], volume.as_array().iter().copied())
            .map_err(|e| PipelineError::ExportError(format!("npy volume: {e}")))
    }
}
