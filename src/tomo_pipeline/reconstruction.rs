//! Reconstruction module
//!
//! The back-projection itself lives behind [`ReconstructionEngine`]; this module
//! validates inputs, applies the aperture mask and drives the engine.

mod command_engine;
mod engine;
mod mean_fill_engine;
mod orchestrator;
pub mod types;


pub use command_engine::{ANGLES_FILE, CommandEngine, GEOMETRY_FILE, PROJECTIONS_FILE, VOLUME_FILE};
pub use engine::ReconstructionEngine;
pub use mean_fill_engine::MeanFillEngine;
pub use orchestrator::Reconstructor;
pub use types::Volume;
