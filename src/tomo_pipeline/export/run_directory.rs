use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::common::timing::StageMillis;
use crate::tomo_pipeline::config::PipelineConfig;

pub const MODEL_DIR: &str = "model";
pub const REPORT_FILE: &str = "config.json";
pub const MIDDLE_SLICES_FILE: &str = "middle_slices.png";
pub const FIRST_FRAME_FILE: &str = "first_frame_comparison.png";
pub const VOLUME_STEM: &str = "reconstruction";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Per-run output folder:
/// `<root>/<base>_<filter>_<threshold>_mask<True|False>_<YYYYmmdd_HHMMSS>/`
/// holding the report and previews, with the mesh and volumes under `model/`.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    path: PathBuf,
    base_name: String,
}

/// `config.json`: written with the parameters when a run starts, then
/// rewritten with the results or the failure once it ends.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub source: String,
    pub processed_at: String,
    pub status: RunStatus,
    #[serde(flatten)]
    pub results: Option<RunResults>,
    #[serde(flatten)]
    pub failure: Option<RunFailure>,
    pub config: &'a PipelineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub failed_stage: &'static str,
    pub error: String,
    pub stage_millis: Vec<StageMillis>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    pub projections: usize,
    pub volume_shape: [usize; 3],
    pub vertices: usize,
    pub faces: usize,
    pub stage_millis: Vec<StageMillis>,
}

impl<'a> RunReport<'a> {
    pub fn started(source: impl Into<String>, config: &'a PipelineConfig) -> Self {
        Self {
            source: source.into(),
            processed_at: processing_date(),
            status: RunStatus::Started,
            results: None,
            failure: None,
            config,
        }
    }

    pub fn completed(self, results: RunResults) -> Self {
        Self {
            status: RunStatus::Completed,
            results: Some(results),
            failure: None,
            ..self
        }
    }

    pub fn failed(self, failure: RunFailure) -> Self {
        Self {
            status: RunStatus::Failed,
            results: None,
            failure: Some(failure),
            ..self
        }
    }
}

impl RunDirectory {
    pub fn directory_name(base_name: &str, config: &PipelineConfig, timestamp: NaiveDateTime) -> String {
        let mask = if config.reconstruction.apply_circular_mask {
            "True"
        } else {
            "False"
        };
        format!(
            "{}_{}_{}_mask{}_{}",
            base_name,
            config.reconstruction.filter,
            config.reconstruction.stl_threshold,
            mask,
            timestamp.format(TIMESTAMP_FORMAT)
        )
    }

    /// Creates a run directory stamped with the current local time.
    pub fn create(root: impl AsRef<Path>, base_name: &str, config: &PipelineConfig) -> Result<Self> {
        Self::create_at(root, base_name, config, Local::now().naive_local())
    }

    pub fn create_at(
        root: impl AsRef<Path>,
        base_name: &str,
        config: &PipelineConfig,
        timestamp: NaiveDateTime,
    ) -> Result<Self> {
        let path = root
            .as_ref()
            .join(Self::directory_name(base_name, config, timestamp));
        fs::create_dir_all(path.join(MODEL_DIR)).map_err(|e| {
            PipelineError::ExportError(format!("cannot create {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Created run directory");
        Ok(Self {
            path,
            base_name: base_name.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn model_dir(&self) -> PathBuf {
        self.path.join(MODEL_DIR)
    }

    /// `model/<base>.<extension>`
    pub fn mesh_path(&self, extension: &str) -> PathBuf {
        self.model_dir().join(format!("{}.{}", self.base_name, extension))
    }

    /// `model/reconstruction.<extension>`
    pub fn volume_path(&self, extension: &str) -> PathBuf {
        self.model_dir().join(format!("{VOLUME_STEM}.{extension}"))
    }

    pub fn middle_slices_path(&self) -> PathBuf {
        self.path.join(MIDDLE_SLICES_FILE)
    }

    pub fn first_frame_path(&self) -> PathBuf {
        self.path.join(FIRST_FRAME_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.path.join(REPORT_FILE)
    }

    pub fn write_report(&self, report: &RunReport<'_>) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(self.report_path(), json)?;
        Ok(())
    }
}

/// Timestamp used in run reports.
pub fn processing_date() -> String {
    Local::now().to_rfc3339()
}
