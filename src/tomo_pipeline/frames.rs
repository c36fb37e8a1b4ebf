//! Frame acquisition module
//!
//! Frame sources (image folders, in-memory frames and, with the `video`
//! feature, video files), the per-frame attenuation transform and the
//! projection stack builder that ties them together.

mod cropped_source;
mod image_sequence_source;
mod memory_source;
mod source;
mod stack_builder;
mod transformer;
pub mod types;
#[cfg(feature = "video")]
mod video_file_source;

pub use cropped_source::CroppedSource;
pub use image_sequence_source::ImageSequenceSource;
pub use memory_source::MemoryFrameSource;
pub use source::{AcquiredSource, FrameSource};
pub use stack_builder::ProjectionStackBuilder;
pub use transformer::{FrameTransformer, attenuation};
pub use types::{FirstFrameSnapshot, Projection, ProjectionStack, RawFrame, StackBuild};
#[cfg(feature = "video")]
pub use video_file_source::VideoFileSource;
