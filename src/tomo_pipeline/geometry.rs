//! Acquisition geometry module

mod builder;
pub mod types;

pub use builder::{build_angles, build_geometry};
pub use types::{AngleSequence, Geometry, GeometryMode};
