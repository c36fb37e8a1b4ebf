use crate::tomo_pipeline::common::error::Result;
use crate::tomo_pipeline::config::FilterType;
use crate::tomo_pipeline::frames::ProjectionStack;
use crate::tomo_pipeline::geometry::{AngleSequence, Geometry};
use crate::tomo_pipeline::reconstruction::types::Volume;

/// Filtered back-projection backend.
///
/// Implementations must be deterministic for fixed inputs and filter, and must
/// return a volume of shape `geometry.volume_shape()`. Failures are reported as
/// [`PipelineError::EngineFailure`](crate::tomo_pipeline::PipelineError::EngineFailure).
pub trait ReconstructionEngine {
    fn name(&self) -> &str;

    fn reconstruct(
        &self,
        projections: &ProjectionStack,
        geometry: &Geometry,
        angles: &AngleSequence,
        filter: FilterType,
    ) -> Result<Volume>;
}
