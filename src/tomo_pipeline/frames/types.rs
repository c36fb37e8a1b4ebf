//! Frame and projection data types

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::tomo_pipeline::common::error::{PipelineError, Result};

/// One decoded video frame, 3-channel, at the source's native resolution.
pub type RawFrame = image::RgbImage;

/// Negative-log attenuation image of shape `(rows, cols)`.
pub type Projection = Array2<f32>;

/// Ordered projections, shape `(count, rows, cols)`. Index `i` belongs to angle `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionStack {
    data: Array3<f32>,
}

impl ProjectionStack {
    /// Stacks projections in the given order. Every projection must have `shape`.
    pub fn from_projections(projections: &[Projection], shape: (usize, usize)) -> Result<Self> {
        let mut data = Array3::zeros((projections.len(), shape.0, shape.1));
        for (i, projection) in projections.iter().enumerate() {
            if projection.dim() != shape {
                return Err(PipelineError::ProjectionShapeMismatch {
                    expected: shape,
                    actual: projection.dim(),
                });
            }
            data.index_axis_mut(Axis(0), i).assign(projection);
        }
        Ok(Self { data })
    }

    pub fn from_array(data: Array3<f32>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(rows, cols)` of every projection in the stack.
    pub fn projection_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    pub fn projection(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn projections(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.data.outer_iter()
    }

    pub fn as_array(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array3<f32> {
        &mut self.data
    }

    pub fn into_array(self) -> Array3<f32> {
        self.data
    }
}

/// First raw frame next to its projection, kept for operator verification.
#[derive(Debug, Clone)]
pub struct FirstFrameSnapshot {
    pub raw: RawFrame,
    pub projection: Projection,
}

/// Result of reading a frame source into a projection stack.
#[derive(Debug, Clone)]
pub struct StackBuild {
    pub stack: ProjectionStack,
    pub snapshot: Option<FirstFrameSnapshot>,
    /// Number of frames that were asked for
    pub requested: usize,
}

impl StackBuild {
    /// True when the source ended before `requested` frames were read.
    pub fn exhausted_early(&self) -> bool {
        self.stack.len() < self.requested
    }
}
