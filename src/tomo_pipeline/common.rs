//! Common utilities module
//!
//! Error type and stage timing shared by every part of the pipeline.

pub mod error;
pub mod timing;

pub use error::{PipelineError, Result};
pub use timing::{PipelineTimings, StageMillis, StageTiming};
