//! Turntable cone-beam CT pipeline
//!
//! Frames of an object spinning in front of a light source are turned into
//! attenuation projections, handed to a reconstruction engine together with
//! the scanner geometry, and the reconstructed volume is meshed into an STL
//! surface. [`ScanPipeline`] wires the stages; every stage is usable on its own.

pub mod common;
pub mod config;
pub mod export;
pub mod frames;
pub mod geometry;
pub mod mask;
pub mod reconstruction;
pub mod scan;
pub mod surface;

pub use common::{PipelineError, PipelineTimings, Result};

pub use config::{
    CropRegion, FilterType, PipelineConfig, PipelineConfigBuilder, StlFormat, TiffCompression,
};

pub use frames::{
    FrameSource, FrameTransformer, ImageSequenceSource, MemoryFrameSource, ProjectionStack,
    ProjectionStackBuilder,
};
#[cfg(feature = "video")]
pub use frames::VideoFileSource;

pub use geometry::{AngleSequence, Geometry, build_angles, build_geometry};

pub use mask::ApertureMask;

pub use reconstruction::{CommandEngine, MeanFillEngine, ReconstructionEngine, Reconstructor, Volume};

pub use surface::{Mesh, SurfaceExtractor};

pub use export::{MeshExporter, RunDirectory, StlWriter, TiffVolumeWriter, VolumeWriter};

pub use scan::{PipelineReport, ScanPipeline};
