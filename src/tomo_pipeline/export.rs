//! Output side of a scan: STL mesh, volume files, previews and the run folder.

pub mod npy;
mod npy_volume_writer;
pub mod preview;
mod run_directory;
mod stl_writer;
mod tiff_volume_writer;
mod writer;

#[cfg(test)]
mod tests;

pub use npy_volume_writer::NpyVolumeWriter;
pub use run_directory::{
    FIRST_FRAME_FILE, MIDDLE_SLICES_FILE, MODEL_DIR, REPORT_FILE, RunDirectory, RunReport,
    RunFailure, RunResults, RunStatus, processing_date,
};
pub use stl_writer::StlWriter;
pub use tiff_volume_writer::TiffVolumeWriter;
pub use writer::{MeshExporter, VolumeWriter};
