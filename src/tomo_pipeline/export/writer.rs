use std::io::Write;

use crate::tomo_pipeline::common::error::Result;
use crate::tomo_pipeline::reconstruction::Volume;
use crate::tomo_pipeline::surface::Mesh;

pub trait MeshExporter {
    /// File extension of the produced format, without the dot.
    fn extension(&self) -> &'static str;
    fn export_mesh(&self, mesh: &Mesh, output: &mut dyn Write) -> Result<()>;
}

pub trait VolumeWriter {
    fn extension(&self) -> &'static str;
    fn write_volume(&self, volume: &Volume, output: &mut dyn Write) -> Result<()>;
}
