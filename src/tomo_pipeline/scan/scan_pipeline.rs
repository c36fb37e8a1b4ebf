use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, info_span, instrument, warn};

use crate::tomo_pipeline::common::error::{PipelineError, Result};
use crate::tomo_pipeline::common::timing::PipelineTimings;
use crate::tomo_pipeline::config::PipelineConfig;
use crate::tomo_pipeline::export::{
    MeshExporter, NpyVolumeWriter, RunDirectory, RunFailure, RunReport, RunResults, StlWriter,
    TiffVolumeWriter, VolumeWriter, preview,
};
use crate::tomo_pipeline::frames::{
    AcquiredSource, CroppedSource, FrameSource, FrameTransformer, ProjectionStackBuilder, StackBuild,
};
use crate::tomo_pipeline::geometry::{build_angles, build_geometry};
use crate::tomo_pipeline::reconstruction::{ReconstructionEngine, Reconstructor, Volume};
use crate::tomo_pipeline::scan::types::PipelineReport;
use crate::tomo_pipeline::surface::SurfaceExtractor;

struct ScanOutputs {
    projections: usize,
    volume_shape: (usize, usize, usize),
    vertices: usize,
    faces: usize,
    mesh_path: PathBuf,
}

/// Runs one turntable scan with an injected engine, mesh exporter and volume writer.
pub struct ScanPipeline<E: ReconstructionEngine, M: MeshExporter, V: VolumeWriter> {
    reconstructor: Reconstructor<E>,
    exporter: M,
    volume_writer: V,
    config: PipelineConfig,
}

impl<E: ReconstructionEngine> ScanPipeline<E, StlWriter, TiffVolumeWriter> {
    pub fn new(engine: E, config: PipelineConfig) -> Self {
        let exporter = StlWriter::new(config.export.stl_format);
        let volume_writer = TiffVolumeWriter::new(config.export.tiff_compression);
        Self::with_custom(engine, exporter, volume_writer, config)
    }
}

impl<E: ReconstructionEngine, M: MeshExporter, V: VolumeWriter> ScanPipeline<E, M, V> {
    pub fn with_custom(engine: E, exporter: M, volume_writer: V, config: PipelineConfig) -> Self {
        Self {
            reconstructor: Reconstructor::new(engine, &config.reconstruction),
            exporter,
            volume_writer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        self.reconstructor.engine()
    }

    /// Acquires `source` only for the duration of the read.
    fn read_stack<S: FrameSource + ?Sized>(&self, source: &mut S) -> Result<StackBuild> {
        let builder = ProjectionStackBuilder::new(FrameTransformer::new(self.config.target_size()));
        let mut acquired = AcquiredSource::acquire(source)?;
        builder.build(&mut acquired, self.config.video.num_frames)
    }

    fn write_file(path: &Path, write: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            PipelineError::ExportError(format!("{}: {}", path.display(), e))
        })?;
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()?;
        Ok(())
    }

    fn write_volume<W: VolumeWriter>(writer: &W, volume: &Volume, run_dir: &RunDirectory) -> Result<()> {
        let path = run_dir.volume_path(writer.extension());
        Self::write_file(&path, |out| writer.write_volume(volume, out))?;
        info!(path = %path.display(), "Saved volume");
        Ok(())
    }

    #[instrument(skip_all, fields(frames = self.config.video.num_frames, engine = self.engine().name()))]
    pub fn run<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        run_dir: &RunDirectory,
    ) -> Result<PipelineReport> {
        self.config.validate()?;
        match self.config.video.crop {
            Some(region) => self.run_recorded(&mut CroppedSource::new(&mut *source, region), run_dir),
            None => self.run_recorded(source, run_dir),
        }
    }

    /// Writes the parameters to the run report before any work, then
    /// rewrites it with the results or with the failing stage.
    fn run_recorded<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        run_dir: &RunDirectory,
    ) -> Result<PipelineReport> {
        let description = source.describe();
        let started = RunReport::started(description.clone(), &self.config);
        run_dir.write_report(&started)?;
        info!(run_dir = %run_dir.path().display(), source = %description, "Starting scan");

        let mut timings = PipelineTimings::new();
        let outcome = self.run_stages(source, run_dir, &mut timings);
        timings.log_summary();

        let outputs = match outcome {
            Ok(outputs) => outputs,
            Err(e) => {
                let failure = RunFailure {
                    failed_stage: e.stage(),
                    error: e.to_string(),
                    stage_millis: timings.to_millis(),
                };
                if let Err(report_err) = run_dir.write_report(&started.failed(failure)) {
                    warn!(error = %report_err, "Could not record the failed run");
                }
                return Err(e);
            }
        };

        let (d0, d1, d2) = outputs.volume_shape;
        run_dir.write_report(&started.completed(RunResults {
            projections: outputs.projections,
            volume_shape: [d0, d1, d2],
            vertices: outputs.vertices,
            faces: outputs.faces,
            stage_millis: timings.to_millis(),
        }))?;

        Ok(PipelineReport {
            source: description,
            projections: outputs.projections,
            volume_shape: outputs.volume_shape,
            vertices: outputs.vertices,
            faces: outputs.faces,
            mesh_path: outputs.mesh_path,
            run_dir: run_dir.path().to_path_buf(),
            timings,
        })
    }

    fn run_stages<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        run_dir: &RunDirectory,
        timings: &mut PipelineTimings,
    ) -> Result<ScanOutputs> {
        let build = {
            let _span = info_span!("build_stack").entered();
            timings.measure("build_stack", || self.read_stack(source))?
        };
        if build.exhausted_early() {
            warn!(
                projections = build.stack.len(),
                requested = build.requested,
                "Source ended before the requested frame count"
            );
        }

        let StackBuild { stack, snapshot, .. } = build;
        if let Some(snapshot) = &snapshot {
            let _span = info_span!("first_frame_preview").entered();
            timings.measure("first_frame_preview", || {
                preview::save_first_frame_comparison(snapshot, &run_dir.first_frame_path())
            })?;
        }

        let (geometry, angles) = {
            let _span = info_span!("geometry").entered();
            let geometry = build_geometry(&self.config.geometry)?;
            (geometry, build_angles(self.config.video.num_frames))
        };

        let projections = stack.len();
        let volume = {
            let _span = info_span!("reconstruct").entered();
            timings.measure("reconstruct", || {
                self.reconstructor.run(stack, &geometry, &angles)
            })?
        };

        {
            let _span = info_span!("save_volume").entered();
            timings.measure("save_volume", || {
                Self::write_volume(&self.volume_writer, &volume, run_dir)?;
                if self.config.export.write_npy {
                    Self::write_volume(&NpyVolumeWriter, &volume, run_dir)?;
                }
                preview::save_middle_slices(&volume, &self.config.visualization, &run_dir.middle_slices_path())
            })?;
        }

        let mesh = {
            let _span = info_span!("extract_surface").entered();
            timings.measure("extract_surface", || {
                SurfaceExtractor::from_config(&self.config.reconstruction)?.extract(&volume)
            })?
        };

        let mesh_path = run_dir.mesh_path(self.exporter.extension());
        {
            let _span = info_span!("export_mesh").entered();
            timings.measure("export_mesh", || {
                Self::write_file(&mesh_path, |out| self.exporter.export_mesh(&mesh, out))
            })?;
        }
        info!(
            path = %mesh_path.display(),
            vertices = mesh.num_vertices(),
            faces = mesh.num_faces(),
            "Saved mesh"
        );

        Ok(ScanOutputs {
            projections,
            volume_shape: volume.shape(),
            vertices: mesh.num_vertices(),
            faces: mesh.num_faces(),
            mesh_path,
        })
    }
}
