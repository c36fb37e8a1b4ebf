//! Scan configuration module
//!
//! Immutable parameter set shared by geometry, masking, reconstruction and
//! surface extraction.

pub mod types;

#[cfg(test)]
mod tests;

pub use types::{
    CropRegion, ExportConfig, FilterType, GeometryConfig, PipelineConfig, PipelineConfigBuilder,
    ReconstructionConfig, StlFormat, TiffCompression, VideoConfig, VisualizationConfig,
};
