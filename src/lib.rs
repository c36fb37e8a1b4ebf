pub mod logger;
pub mod tomo_pipeline;
