//! Circular aperture mask
//!
//! A cone-beam detector only sees the object through a circular field of view.
//! Everything in the corners outside that disk is set to zero attenuation so it
//! cannot bias the back-projection. Pixels inside the disk (distance to the
//! center `<= radius`) are kept.

use ndarray::{Array2, ArrayViewMut2, Zip};
use tracing::debug;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::frames::ProjectionStack;

#[derive(Debug, Clone, PartialEq)]
pub struct ApertureMask {
    center: (usize, usize),
    radius: usize,
    /// `true` where the pixel is kept
    inside: Array2<bool>,
}

impl ApertureMask {
    /// Largest disk centred at `(width / 2, height / 2)` that fits in the frame.
    pub fn new(height: usize, width: usize) -> Self {
        let center_x = width / 2;
        let center_y = height / 2;
        let radius = center_x.min(center_y);
        let radius_sq = (radius * radius) as i64;

        let inside = Array2::from_shape_fn((height, width), |(y, x)| {
            let dx = x as i64 - center_x as i64;
            let dy = y as i64 - center_y as i64;
            dx * dx + dy * dy <= radius_sq
        });

        debug!(height, width, center_x, center_y, radius, "Built aperture mask");
        Self {
            center: (center_x, center_y),
            radius,
            inside,
        }
    }

    /// `(x, y)` of the disk center.
    pub fn center(&self) -> (usize, usize) {
        self.center
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// `(rows, cols)` this mask applies to.
    pub fn shape(&self) -> (usize, usize) {
        self.inside.dim()
    }

    pub fn kept_count(&self) -> usize {
        self.inside.iter().filter(|kept| **kept).count()
    }

    pub fn is_kept(&self, row: usize, col: usize) -> bool {
        self.inside[[row, col]]
    }

    pub fn as_array(&self) -> &Array2<bool> {
        &self.inside
    }

    /// Zeroes every pixel of `projection` outside the disk.
    pub fn apply(&self, mut projection: ArrayViewMut2<'_, f32>) -> Result<()> {
        if projection.dim() != self.shape() {
            return Err(PipelineError::ProjectionShapeMismatch {
                expected: self.shape(),
                actual: projection.dim(),
            });
        }

        Zip::from(&mut projection)
            .and(&self.inside)
            .for_each(|value, &kept| {
                if !kept {
                    *value = 0.0;
                }
            });
        Ok(())
    }

    /// Applies the same mask to every projection of the stack.
    pub fn apply_stack(&self, stack: &mut ProjectionStack) -> Result<()> {
        for projection in stack.as_array_mut().outer_iter_mut() {
            self.apply(projection)?;
        }
        Ok(())
    }
}
