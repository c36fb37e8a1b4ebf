use ndarray::Array3;
use tracing::debug;

use crate::tomo_pipeline::common::error::Result;
use crate::tomo_pipeline::config::FilterType;
use crate::tomo_pipeline::frames::ProjectionStack;
use crate::tomo_pipeline::geometry::{AngleSequence, Geometry};
use crate::tomo_pipeline::reconstruction::engine::ReconstructionEngine;
use crate::tomo_pipeline::reconstruction::types::Volume;

/// Dry-run engine: fills the whole volume with the mean projection value.
///
/// Useful to exercise a full run (frames, geometry, exports) without a
/// back-projection backend. Its output is always flat, so surface extraction
/// reports a degenerate volume.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeanFillEngine;

impl ReconstructionEngine for MeanFillEngine {
    fn name(&self) -> &str {
        "mean-fill"
    }

    fn reconstruct(
        &self,
        projections: &ProjectionStack,
        geometry: &Geometry,
        _angles: &AngleSequence,
        filter: FilterType,
    ) -> Result<Volume> {
        let mean = projections.as_array().mean().unwrap_or(0.0);
        debug!(mean, %filter, "Filling volume with mean attenuation");
        Ok(Volume::from_array(Array3::from_elem(geometry.volume_shape(), mean)))
    }
}
