//! End-to-end scan: frames to projections, reconstruction, volume and mesh outputs.

mod scan_pipeline;
pub mod types;


pub use scan_pipeline::ScanPipeline;
pub use types::PipelineReport;
