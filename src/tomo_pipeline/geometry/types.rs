//! Cone-beam geometry types

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryMode {
    Cone,
}

/// Acquisition geometry handed to the reconstruction engine. Built once per run.
///
/// Distances are in mm, volume sizes in voxel units (one voxel per unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Distance source to detector
    pub dsd: f64,
    /// Distance source to origin
    pub dso: f64,
    /// Voxel count per axis
    pub n_voxel: [usize; 3],
    /// Physical volume size per axis
    pub s_voxel: [f64; 3],
    /// Voxel spacing per axis
    pub d_voxel: [f64; 3],
    /// Detector pixel count (rows, cols)
    pub n_detector: [usize; 2],
    /// Detector pixel pitch
    pub d_detector: [f64; 2],
    /// Physical detector size
    pub s_detector: [f64; 2],
    pub off_origin: [f64; 3],
    pub off_detector: [f64; 2],
    pub mode: GeometryMode,
    /// Ray sampling accuracy for engines that ask for it
    pub accuracy: f64,
}

impl Geometry {
    /// `(rows, cols)` every projection must have.
    pub fn detector_shape(&self) -> (usize, usize) {
        (self.n_detector[0], self.n_detector[1])
    }

    pub fn volume_shape(&self) -> (usize, usize, usize) {
        (self.n_voxel[0], self.n_voxel[1], self.n_voxel[2])
    }

    /// Source-to-detector over source-to-object distance.
    pub fn magnification(&self) -> f64 {
        self.dsd / self.dso
    }
}

/// Rotation angles in radians, one per projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSequence(Vec<f64>);

impl AngleSequence {
    /// `count` angles linearly spaced over the closed interval `[0, 2π]`.
    ///
    /// Both ends are included, so for `count > 1` the last angle repeats the
    /// start pose one full turn later.
    pub fn full_turn(count: usize) -> Self {
        let angles = match count {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => {
                let step = 2.0 * PI / (count - 1) as f64;
                (0..count)
                    .map(|i| if i == count - 1 { 2.0 * PI } else { i as f64 * step })
                    .collect()
            }
        };
        Self(angles)
    }

    pub fn from_radians(angles: Vec<f64>) -> Self {
        Self(angles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
