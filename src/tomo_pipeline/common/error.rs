use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to open frame source: {0}")]
    SourceOpen(String),

    #[error("Failed to read frame: {0}")]
    FrameRead(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Projection count {projections} does not match angle count {angles}")]
    ProjectionCountMismatch { projections: usize, angles: usize },

    #[error("Projection shape {actual:?} does not match expected detector shape {expected:?}")]
    ProjectionShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Reconstructed volume has no dynamic range (every voxel is {value})")]
    DegenerateVolume { value: f32 },

    #[error("Reconstruction engine failed: {0}")]
    EngineFailure(String),

    #[error("Failed to export: {0}")]
    ExportError(String),

    #[error("Failed to encode output: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl PipelineError {
    /// Name of the pipeline stage this error aborts.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::SourceOpen(_) | Self::FrameRead(_) => "frames",
            Self::InvalidConfig(_) => "config",
            Self::ProjectionCountMismatch { .. }
            | Self::ProjectionShapeMismatch { .. }
            | Self::EngineFailure(_) => "reconstruction",
            Self::InvalidDimensions(..) | Self::DegenerateVolume { .. } => "surface",
            Self::ExportError(_) | Self::EncodeError(_) | Self::IoError(_) | Self::JsonError(_) => {
                "export"
            }
        }
    }

    pub fn is_configuration_mismatch(&self) -> bool {
        matches!(
            self,
            Self::ProjectionCountMismatch { .. } | Self::ProjectionShapeMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
