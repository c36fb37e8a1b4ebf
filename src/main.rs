use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, ValueEnum};
use tracing::{error, info};

use turntable_ct_rs::logger;
use turntable_ct_rs::tomo_pipeline::{
    CommandEngine, CropRegion, FilterType, FrameSource, ImageSequenceSource, MeanFillEngine,
    PipelineConfig, PipelineConfigBuilder, PipelineError, PipelineReport, ReconstructionEngine,
    RunDirectory, ScanPipeline,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EngineKind {
    /// Fill the volume with the mean projection value (dry run).
    MeanFill,
    /// Run an external reconstruction program over an npy exchange folder.
    Command,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reconstruct an STL surface from turntable video frames",
    group(ArgGroup::new("input").required(true).args(["frames", "video"]))
)]
struct Args {
    /// Directory of decoded frames, read in file-name order.
    #[arg(long)]
    frames: Option<PathBuf>,
    /// Turntable video file (needs the `video` feature).
    #[arg(long)]
    video: Option<PathBuf>,
    /// Root folder receiving one run directory per scan.
    #[arg(long, default_value = "final_config")]
    output_root: PathBuf,
    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    num_frames: Option<usize>,
    /// ram_lak, shepp_logan, cosine, hamming or hann.
    #[arg(long)]
    filter: Option<FilterType>,
    /// Normalized iso-level in [0, 1].
    #[arg(long)]
    threshold: Option<f32>,
    /// Keep the detector corners outside the circular aperture.
    #[arg(long)]
    no_mask: bool,
    /// Square crop applied to every frame, as X,Y,SIZE.
    #[arg(long)]
    crop: Option<CropRegion>,
    #[arg(long, value_enum, default_value_t = EngineKind::MeanFill)]
    engine: EngineKind,
    /// Program invoked by the command engine.
    #[arg(long)]
    engine_program: Option<PathBuf>,
    /// Extra argument for the engine program; repeatable.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let base = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let mut builder = PipelineConfigBuilder::from_config(base);
    if let Some(count) = args.num_frames {
        builder = builder.num_frames(count);
    }
    if let Some(filter) = args.filter {
        builder = builder.filter(filter);
    }
    if let Some(threshold) = args.threshold {
        builder = builder.stl_threshold(threshold);
    }
    if args.no_mask {
        builder = builder.apply_circular_mask(false);
    }
    if let Some(region) = args.crop {
        builder = builder.crop(Some(region));
    }

    let config = builder.build();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Video file stem, or the frame folder name.
fn base_name(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("scan")
        .to_string()
}

#[cfg(feature = "video")]
fn video_source(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    Ok(Box::new(turntable_ct_rs::tomo_pipeline::VideoFileSource::new(path)))
}

#[cfg(not(feature = "video"))]
fn video_source(path: &Path) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!(
        "cannot read {}: built without the `video` feature; rebuild with --features video \
         or pass extracted frames with --frames",
        path.display()
    )
}

fn open_input(args: &Args) -> anyhow::Result<(Box<dyn FrameSource>, &Path)> {
    match (&args.frames, &args.video) {
        (Some(frames), _) => Ok((Box::new(ImageSequenceSource::new(frames)), frames.as_path())),
        (None, Some(video)) => Ok((video_source(video)?, video.as_path())),
        (None, None) => anyhow::bail!("either --frames or --video is required"),
    }
}

fn scan<E: ReconstructionEngine>(
    engine: E,
    config: PipelineConfig,
    source: &mut dyn FrameSource,
    run_dir: &RunDirectory,
) -> Result<PipelineReport, PipelineError> {
    ScanPipeline::new(engine, config).run(source, run_dir)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_with_verbosity(args.verbose);

    let config = load_config(&args)?;
    let (mut source, input) = open_input(&args)?;
    let run_dir = RunDirectory::create(&args.output_root, &base_name(input), &config)
        .context("creating run directory")?;

    info!(
        input = %input.display(),
        filter = %config.reconstruction.filter,
        threshold = config.reconstruction.stl_threshold,
        mask = config.reconstruction.apply_circular_mask,
        engine = ?args.engine,
        "Starting turntable-ct"
    );

    let result = match args.engine {
        EngineKind::MeanFill => scan(MeanFillEngine, config, &mut *source, &run_dir),
        EngineKind::Command => {
            let program = args
                .engine_program
                .as_ref()
                .context("--engine command needs --engine-program")?;
            let engine = CommandEngine::new(program, run_dir.path().join("engine"))
                .with_args(args.engine_args.iter());
            scan(engine, config, &mut *source, &run_dir)
        }
    };

    match result {
        Ok(report) => {
            info!(
                mesh = %report.mesh_path.display(),
                projections = report.projections,
                faces = report.faces,
                "Scan complete"
            );
            Ok(())
        }
        Err(e) => {
            let stage = e.stage();
            error!(stage, "Scan failed: {}", e);
            Err(anyhow::Error::new(e).context(format!("scan failed at the {stage} stage")))
        }
    }
}
