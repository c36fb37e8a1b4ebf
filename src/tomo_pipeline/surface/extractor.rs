use ndarray::{Array3, s};
use tracing::{debug, instrument, warn};

use super::marching_cubes::marching_cubes;
use super::types::Mesh;
use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::ReconstructionConfig;
use crate::tomo_pipeline::reconstruction::Volume;

/// Iso-level between the 0 and 1 labels of the binarized volume.
const BINARY_ISO: f32 = 0.5;

/// Turns a reconstructed volume into a closed triangle surface.
///
/// The volume is rescaled to `[0, 1]`, thresholded into solid/empty voxels,
/// optionally padded with one empty voxel on every side, and meshed with
/// marching cubes at the midpoint between the two labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceExtractor {
    threshold: f32,
    close_boundary: bool,
}

impl SurfaceExtractor {
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "stl threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(Self {
            threshold,
            close_boundary: true,
        })
    }

    pub fn from_config(config: &ReconstructionConfig) -> Result<Self> {
        Ok(Self::new(config.stl_threshold)?.with_close_boundary(config.close_boundary))
    }

    /// Pads the binary volume so solids touching the border still close.
    pub fn with_close_boundary(mut self, close_boundary: bool) -> Self {
        self.close_boundary = close_boundary;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Rescales `volume` so its minimum maps to 0 and its maximum to 1.
    pub fn normalize(volume: &Volume) -> Result<Array3<f32>> {
        if volume.is_empty() {
            let (d0, d1, d2) = volume.shape();
            return Err(PipelineError::InvalidDimensions(d0 * d1, d2));
        }
        let (min, max) = volume
            .min_max()
            .ok_or(PipelineError::DegenerateVolume { value: f32::NAN })?;
        if max == min {
            return Err(PipelineError::DegenerateVolume { value: min });
        }
        let range = max - min;
        Ok(volume.as_array().mapv(|v| (v - min) / range))
    }

    /// Solid voxels are 1, everything else (NaN included) is 0.
    pub fn binarize(&self, normalized: &Array3<f32>) -> Array3<f32> {
        let threshold = self.threshold;
        let labels = normalized.mapv(|v| if v > threshold { 1.0 } else { 0.0 });
        if !self.close_boundary {
            return labels;
        }
        let (d0, d1, d2) = labels.dim();
        let mut padded = Array3::zeros((d0 + 2, d1 + 2, d2 + 2));
        padded
            .slice_mut(s![1..d0 + 1, 1..d1 + 1, 1..d2 + 1])
            .assign(&labels);
        padded
    }

    /// Extracts the surface; vertex coordinates are voxel indices of `volume`.
    #[instrument(skip(self, volume), fields(threshold = self.threshold))]
    pub fn extract(&self, volume: &Volume) -> Result<Mesh> {
        let normalized = Self::normalize(volume)?;
        let labels = self.binarize(&normalized);

        let (d0, d1, d2) = labels.dim();
        if d0 < 2 || d1 < 2 || d2 < 2 {
            return Err(PipelineError::InvalidDimensions(d0 * d1, d2));
        }
        let solid = labels.iter().filter(|v| **v > 0.0).count();
        debug!(solid, total = labels.len(), "Binarized volume");

        let mut mesh = marching_cubes(labels.view(), BINARY_ISO);
        if self.close_boundary {
            for vertex in &mut mesh.vertices {
                *vertex -= 1.0;
            }
        }

        if mesh.is_empty() {
            warn!(
                threshold = self.threshold,
                "No voxel crosses the threshold, surface is empty"
            );
        } else {
            debug!(
                vertices = mesh.num_vertices(),
                faces = mesh.num_faces(),
                "Extracted surface"
            );
        }
        Ok(mesh)
    }
}
