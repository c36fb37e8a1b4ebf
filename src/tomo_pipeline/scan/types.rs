use std::path::PathBuf;

use crate::tomo_pipeline::common::timing::PipelineTimings;

/// What a completed scan produced and how long each stage took.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub source: String,
    pub projections: usize,
    pub volume_shape: (usize, usize, usize),
    pub vertices: usize,
    pub faces: usize,
    pub mesh_path: PathBuf,
    pub run_dir: PathBuf,
    pub timings: PipelineTimings,
}
