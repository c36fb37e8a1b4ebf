//! Reconstruction through an external program.
//!
//! The exchange happens through a work directory:
//!
//! * `projections.npy` - `float32`, shape `(count, rows, cols)`
//! * `angles.npy` - `float64`, shape `(count,)`, radians
//! * `geometry.json` - the [`Geometry`] plus the filter name
//!
//! The program is called as `<program> <args..> --workdir <dir> --filter <name>`
//! and must leave a `float32` or `float64` `volume.npy` behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::config::FilterType;
use crate::tomo_pipeline::export::npy;
use crate::tomo_pipeline::frames::ProjectionStack;
use crate::tomo_pipeline::geometry::{AngleSequence, Geometry};
use crate::tomo_pipeline::reconstruction::engine::ReconstructionEngine;
use crate::tomo_pipeline::reconstruction::types::Volume;

pub const PROJECTIONS_FILE: &str = "projections.npy";
pub const ANGLES_FILE: &str = "angles.npy";
pub const GEOMETRY_FILE: &str = "geometry.json";
pub const VOLUME_FILE: &str = "volume.npy";

#[derive(Serialize)]
struct EngineRequest<'a> {
    geometry: &'a Geometry,
    filter: FilterType,
}

#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    workdir: PathBuf,
}

impl CommandEngine {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(program: P, workdir: Q) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn engine_error(&self, what: &str, e: impl std::fmt::Display) -> PipelineError {
        PipelineError::EngineFailure(format!("{} ({}): {}", what, self.program.display(), e))
    }

    fn write_inputs(
        &self,
        projections: &ProjectionStack,
        geometry: &Geometry,
        angles: &AngleSequence,
        filter: FilterType,
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.workdir)?;

        let data = projections.as_array();
        let mut out = BufWriter::new(File::create(self.workdir.join(PROJECTIONS_FILE))?);
        npy::write_array(&mut out, data.shape(), data.iter().copied())?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(self.workdir.join(ANGLES_FILE))?);
        npy::write_array(&mut out, &[angles.len()], angles.as_slice().iter().copied())?;
        out.flush()?;

        let request = EngineRequest { geometry, filter };
        let json = serde_json::to_string_pretty(&request).map_err(std::io::Error::other)?;
        std::fs::write(self.workdir.join(GEOMETRY_FILE), json)
    }
}

impl ReconstructionEngine for CommandEngine {
    fn name(&self) -> &str {
        "command"
    }

    fn reconstruct(
        &self,
        projections: &ProjectionStack,
        geometry: &Geometry,
        angles: &AngleSequence,
        filter: FilterType,
    ) -> Result<Volume> {
        self.write_inputs(projections, geometry, angles, filter)
            .map_err(|e| self.engine_error("writing engine inputs", e))?;
        debug!(workdir = %self.workdir.display(), "Engine inputs written");

        let volume_path = self.workdir.join(VOLUME_FILE);
        if volume_path.exists() {
            std::fs::remove_file(&volume_path)
                .map_err(|e| self.engine_error("removing stale volume", e))?;
        }

        info!(program = %self.program.display(), %filter, "Running reconstruction command");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg("--workdir")
            .arg(&self.workdir)
            .arg("--filter")
            .arg(filter.as_str())
            .status()
            .map_err(|e| self.engine_error("launching", e))?;

        if !status.success() {
            return Err(self.engine_error("reconstruction command", format!("exited with {status}")));
        }

        let file = File::open(&volume_path)
            .map_err(|e| self.engine_error("opening volume.npy", e))?;
        let data = npy::read_array3(&mut BufReader::new(file))
            .map_err(|e| self.engine_error("reading volume.npy", e))?;
        Ok(Volume::from_array(data))
    }
}
