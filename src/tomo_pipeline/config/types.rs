//! Scan configuration types
//!
//! One immutable [`PipelineConfig`] is built at startup and handed by reference to
//! every stage. Defaults reproduce the bench setup the scanner was tuned on.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tomo_pipeline::common::error::{PipelineError, Result};

/// Filter kernel applied by the reconstruction engine before back-projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    RamLak,
    /// Softer roll-off than Ram-Lak, reduces ring artifacts
    #[default]
    SheppLogan,
    Cosine,
    Hamming,
    Hann,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::RamLak,
        FilterType::SheppLogan,
        FilterType::Cosine,
        FilterType::Hamming,
        FilterType::Hann,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::RamLak => "ram_lak",
            FilterType::SheppLogan => "shepp_logan",
            FilterType::Cosine => "cosine",
            FilterType::Hamming => "hamming",
            FilterType::Hann => "hann",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        FilterType::ALL
            .into_iter()
            .find(|filter| filter.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown filter '{s}', expected one of: ram_lak, shepp_logan, cosine, hamming, hann"
                )
            })
    }
}

/// TIFF compression methods for the persisted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced (default)
    #[default]
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StlFormat {
    #[default]
    Binary,
    Ascii,
}

/// Square region cut out of every raw frame before it is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge in source pixels
    pub x: u32,
    /// Top edge in source pixels
    pub y: u32,
    /// Side length of the square
    pub size: u32,
}

impl FromStr for CropRegion {
    type Err = String;

    /// Parses `X,Y,SIZE`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid crop '{s}': {e}"))?;

        match parts.as_slice() {
            [x, y, size] if *size > 0 => Ok(CropRegion { x: *x, y: *y, size: *size }),
            [_, _, _] => Err(format!("invalid crop '{s}': size must be positive")),
            _ => Err(format!("invalid crop '{s}': expected X,Y,SIZE")),
        }
    }
}

/// Cone-beam acquisition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Side of the reconstructed cubic volume, in voxels
    pub image_size: usize,
    /// Side of the square detector, in pixels; also the projection size
    pub detector_size: usize,
    /// Distance source to detector (mm)
    pub dsd: f64,
    /// Distance source to rotation axis (mm)
    pub dso: f64,
    /// Detector pixel pitch (mm)
    pub pixel_size: f64,
}

impl GeometryConfig {
    /// Range checks shared by config loading and geometry derivation.
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 || self.detector_size == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "image_size ({}) and detector_size ({}) must be positive",
                self.image_size, self.detector_size
            )));
        }
        if !(self.pixel_size.is_finite() && self.pixel_size > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "pixel_size must be positive, got {}",
                self.pixel_size
            )));
        }
        if !(self.dso.is_finite() && self.dsd.is_finite() && self.dso > 0.0 && self.dso < self.dsd) {
            return Err(PipelineError::InvalidConfig(format!(
                "expected 0 < DSO < DSD, got DSO={} DSD={}",
                self.dso, self.dsd
            )));
        }
        Ok(())
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            image_size: 200,
            detector_size: 200,
            dsd: 628.0,
            dso: 456.0,
            pixel_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    pub filter: FilterType,
    /// Normalised iso-level in [0, 1] used for the surface cut. A tunable, not a
    /// derived constant: higher values give a smaller, more conservative surface.
    pub stl_threshold: f32,
    /// Zero the detector corners outside the illuminated disk before reconstruction
    pub apply_circular_mask: bool,
    /// Pad the binary field so solids touching the volume border still close
    pub close_boundary: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            filter: FilterType::SheppLogan,
            stl_threshold: 0.4,
            apply_circular_mask: true,
            close_boundary: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Number of frames (and therefore angles) sampled over one full turn
    pub num_frames: usize,
    pub crop: Option<CropRegion>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            num_frames: 800,
            crop: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Stretch preview contrast between percentiles instead of min/max
    pub auto_contrast: bool,
    /// Lower and upper percentiles for contrast stretching
    pub contrast_percentiles: (f32, f32),
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            auto_contrast: true,
            contrast_percentiles: (1.0, 99.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub tiff_compression: TiffCompression,
    pub stl_format: StlFormat,
    /// Also keep the raw volume as `reconstruction.npy`
    pub write_npy: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tiff_compression: TiffCompression::DeflateBalanced,
            stl_format: StlFormat::Binary,
            write_npy: true,
        }
    }
}

/// Complete configuration for one scan run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub geometry: GeometryConfig,
    pub reconstruction: ReconstructionConfig,
    pub video: VideoConfig,
    pub visualization: VisualizationConfig,
    pub export: ExportConfig,
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Loads a JSON file; missing sections and fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Side length of every projection fed to the engine.
    pub fn target_size(&self) -> u32 {
        self.geometry.detector_size as u32
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;

        let threshold = self.reconstruction.stl_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "stl_threshold must lie in [0, 1], got {threshold}"
            )));
        }

        if self.video.num_frames == 0 {
            return Err(PipelineError::InvalidConfig(
                "num_frames must be positive".to_string(),
            ));
        }

        let (lo, hi) = self.visualization.contrast_percentiles;
        if !(0.0 <= lo && lo < hi && hi <= 100.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "contrast_percentiles must satisfy 0 <= lo < hi <= 100, got ({lo}, {hi})"
            )));
        }

        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    base: Option<PipelineConfig>,
    image_size: Option<usize>,
    detector_size: Option<usize>,
    dsd: Option<f64>,
    dso: Option<f64>,
    pixel_size: Option<f64>,
    num_frames: Option<usize>,
    crop: Option<Option<CropRegion>>,
    filter: Option<FilterType>,
    stl_threshold: Option<f32>,
    apply_circular_mask: Option<bool>,
    close_boundary: Option<bool>,
    auto_contrast: Option<bool>,
    tiff_compression: Option<TiffCompression>,
    stl_format: Option<StlFormat>,
    write_npy: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Starts from `config` instead of the defaults; later setters override it.
    pub fn from_config(config: PipelineConfig) -> Self {
        Self {
            base: Some(config),
            ..Self::default()
        }
    }

    pub fn image_size(mut self, size: usize) -> Self {
        self.image_size = Some(size);
        self
    }

    pub fn detector_size(mut self, size: usize) -> Self {
        self.detector_size = Some(size);
        self
    }

    pub fn distances(mut self, dsd: f64, dso: f64) -> Self {
        self.dsd = Some(dsd);
        self.dso = Some(dso);
        self
    }

    pub fn pixel_size(mut self, pitch: f64) -> Self {
        self.pixel_size = Some(pitch);
        self
    }

    pub fn num_frames(mut self, count: usize) -> Self {
        self.num_frames = Some(count);
        self
    }

    pub fn crop(mut self, crop: Option<CropRegion>) -> Self {
        self.crop = Some(crop);
        self
    }

    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn stl_threshold(mut self, threshold: f32) -> Self {
        self.stl_threshold = Some(threshold);
        self
    }

    pub fn apply_circular_mask(mut self, enable: bool) -> Self {
        self.apply_circular_mask = Some(enable);
        self
    }

    pub fn close_boundary(mut self, enable: bool) -> Self {
        self.close_boundary = Some(enable);
        self
    }

    pub fn auto_contrast(mut self, enable: bool) -> Self {
        self.auto_contrast = Some(enable);
        self
    }

    pub fn tiff_compression(mut self, compression: TiffCompression) -> Self {
        self.tiff_compression = Some(compression);
        self
    }

    pub fn stl_format(mut self, format: StlFormat) -> Self {
        self.stl_format = Some(format);
        self
    }

    pub fn write_npy(mut self, enable: bool) -> Self {
        self.write_npy = Some(enable);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let mut config = self.base.unwrap_or_default();
        let geometry = &mut config.geometry;
        geometry.image_size = self.image_size.unwrap_or(geometry.image_size);
        geometry.detector_size = self.detector_size.unwrap_or(geometry.detector_size);
        geometry.dsd = self.dsd.unwrap_or(geometry.dsd);
        geometry.dso = self.dso.unwrap_or(geometry.dso);
        geometry.pixel_size = self.pixel_size.unwrap_or(geometry.pixel_size);

        let reconstruction = &mut config.reconstruction;
        reconstruction.filter = self.filter.unwrap_or(reconstruction.filter);
        reconstruction.stl_threshold = self.stl_threshold.unwrap_or(reconstruction.stl_threshold);
        reconstruction.apply_circular_mask = self
            .apply_circular_mask
            .unwrap_or(reconstruction.apply_circular_mask);
        reconstruction.close_boundary = self.close_boundary.unwrap_or(reconstruction.close_boundary);

        config.video.num_frames = self.num_frames.unwrap_or(config.video.num_frames);
        config.video.crop = self.crop.unwrap_or(config.video.crop);

        config.visualization.auto_contrast = self
            .auto_contrast
            .unwrap_or(config.visualization.auto_contrast);

        let export = &mut config.export;
        export.tiff_compression = self.tiff_compression.unwrap_or(export.tiff_compression);
        export.stl_format = self.stl_format.unwrap_or(export.stl_format);
        export.write_npy = self.write_npy.unwrap_or(export.write_npy);

        config
    }
}
