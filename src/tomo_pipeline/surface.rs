//! Iso-surface extraction
//!
//! Binarizes a reconstructed volume at a normalized threshold and meshes the
//! boundary between solid and empty voxels.

mod extractor;
pub mod marching_cubes;
pub mod types;

#[cfg(test)]
mod tests;

pub use extractor::SurfaceExtractor;
pub use marching_cubes::marching_cubes;
pub use types::Mesh;
