use tracing::{info, instrument};

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::{FilterType, ReconstructionConfig};
use crate::tomo_pipeline::frames::ProjectionStack;
use crate::tomo_pipeline::geometry::{AngleSequence, Geometry};
use crate::tomo_pipeline::mask::ApertureMask;
use crate::tomo_pipeline::reconstruction::engine::ReconstructionEngine;
use crate::tomo_pipeline::reconstruction::types::Volume;

/// Checks the projection stack against the geometry, masks it and hands it to
/// the engine. Engine failures are returned as-is, never retried.
pub struct Reconstructor<E: ReconstructionEngine> {
    engine: E,
    filter: FilterType,
    apply_mask: bool,
}

impl<E: ReconstructionEngine> Reconstructor<E> {
    pub fn new(engine: E, config: &ReconstructionConfig) -> Self {
        Self {
            engine,
            filter: config.filter,
            apply_mask: config.apply_circular_mask,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    fn validate(&self, stack: &ProjectionStack, geometry: &Geometry, angles: &AngleSequence) -> Result<()> {
        if stack.len() != angles.len() {
            return Err(PipelineError::ProjectionCountMismatch {
                projections: stack.len(),
                angles: angles.len(),
            });
        }
        if stack.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "cannot reconstruct from zero projections".to_string(),
            ));
        }
        if stack.projection_shape() != geometry.detector_shape() {
            return Err(PipelineError::ProjectionShapeMismatch {
                expected: geometry.detector_shape(),
                actual: stack.projection_shape(),
            });
        }
        Ok(())
    }

    #[instrument(skip_all, fields(engine = self.engine.name(), filter = %self.filter, projections = stack.len()))]
    pub fn run(
        &self,
        mut stack: ProjectionStack,
        geometry: &Geometry,
        angles: &AngleSequence,
    ) -> Result<Volume> {
        self.validate(&stack, geometry, angles)?;

        if self.apply_mask {
            let _span = tracing::info_span!("aperture_mask").entered();
            let (rows, cols) = stack.projection_shape();
            let mask = ApertureMask::new(rows, cols);
            mask.apply_stack(&mut stack)?;
            info!(radius = mask.radius(), kept = mask.kept_count(), "Applied circular aperture mask");
        }

        let volume = {
            let _span = tracing::info_span!("engine").entered();
            self.engine.reconstruct(&stack, geometry, angles, self.filter)?
        };

        if volume.shape() != geometry.volume_shape() {
            return Err(PipelineError::EngineFailure(format!(
                "{} returned a {:?} volume, expected {:?}",
                self.engine.name(),
                volume.shape(),
                geometry.volume_shape()
            )));
        }

        info!(shape = ?volume.shape(), "Reconstruction complete");
        Ok(volume)
    }
}
