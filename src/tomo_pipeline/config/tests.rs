use std::io::Write;

use crate::tomo_pipeline::common::error::PipelineError;
use crate::tomo_pipeline::config::types::{
    CropRegion, FilterType, PipelineConfig, PipelineConfigBuilder, StlFormat, TiffCompression,
};

#[test]
fn test_defaults_match_bench_setup() {
    let config = PipelineConfig::default();

    assert_eq!(config.geometry.image_size, 200);
    assert_eq!(config.geometry.detector_size, 200);
    assert_eq!(config.geometry.dsd, 628.0);
    assert_eq!(config.geometry.dso, 456.0);
    assert_eq!(config.video.num_frames, 800);
    assert_eq!(config.reconstruction.filter, FilterType::SheppLogan);
    assert_eq!(config.reconstruction.stl_threshold, 0.4);
    assert!(config.reconstruction.apply_circular_mask);
    assert_eq!(config.target_size(), 200);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_builder() {
    let config = PipelineConfig::builder()
        .image_size(64)
        .detector_size(96)
        .num_frames(4)
        .filter(FilterType::Hann)
        .stl_threshold(0.7)
        .apply_circular_mask(false)
        .tiff_compression(TiffCompression::Lzw)
        .stl_format(StlFormat::Ascii)
        .build();

    assert_eq!(config.geometry.image_size, 64);
    assert_eq!(config.geometry.detector_size, 96);
    assert_eq!(config.target_size(), 96);
    assert_eq!(config.video.num_frames, 4);
    assert_eq!(config.reconstruction.filter, FilterType::Hann);
    assert_eq!(config.reconstruction.stl_threshold, 0.7);
    assert!(!config.reconstruction.apply_circular_mask);
    assert_eq!(config.export.tiff_compression, TiffCompression::Lzw);
    assert_eq!(config.export.stl_format, StlFormat::Ascii);
    // untouched fields keep their defaults
    assert_eq!(config.geometry.dsd, 628.0);
}

#[test]
fn test_builder_overrides_a_loaded_config() {
    let base = PipelineConfig::builder().num_frames(12).build();
    let config = PipelineConfigBuilder::from_config(base).filter(FilterType::Cosine).build();

    assert_eq!(config.video.num_frames, 12);
    assert_eq!(config.reconstruction.filter, FilterType::Cosine);
}

#[test]
fn test_filter_names_round_trip_through_text() {
    for filter in FilterType::ALL {
        assert_eq!(filter.as_str().parse::<FilterType>(), Ok(filter));
    }
    assert_eq!("Ram-Lak".parse::<FilterType>(), Ok(FilterType::RamLak));
    assert!("butterworth".parse::<FilterType>().is_err());
}

#[test]
fn test_crop_region_parsing() {
    assert_eq!(
        "10, 20,300".parse::<CropRegion>(),
        Ok(CropRegion { x: 10, y: 20, size: 300 })
    );
    assert!("10,20".parse::<CropRegion>().is_err());
    assert!("10,20,0".parse::<CropRegion>().is_err());
    assert!("a,b,c".parse::<CropRegion>().is_err());
}

#[test]
fn test_validation_rejects_bad_values() {
    let out_of_range = PipelineConfig::builder().stl_threshold(1.5).build();
    assert!(matches!(out_of_range.validate(), Err(PipelineError::InvalidConfig(_))));

    let inverted = PipelineConfig::builder().distances(100.0, 200.0).build();
    assert!(matches!(inverted.validate(), Err(PipelineError::InvalidConfig(_))));

    let no_frames = PipelineConfig::builder().num_frames(0).build();
    assert!(matches!(no_frames.validate(), Err(PipelineError::InvalidConfig(_))));

    let empty_detector = PipelineConfig::builder().detector_size(0).build();
    assert!(matches!(empty_detector.validate(), Err(PipelineError::InvalidConfig(_))));
}

#[test]
fn test_partial_json_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "reconstruction": {{ "filter": "hamming", "stl_threshold": 0.25 }},
             "video": {{ "num_frames": 360, "crop": {{ "x": 4, "y": 8, "size": 120 }} }} }}"#
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();

    assert_eq!(config.reconstruction.filter, FilterType::Hamming);
    assert_eq!(config.reconstruction.stl_threshold, 0.25);
    assert!(config.reconstruction.apply_circular_mask);
    assert_eq!(config.video.num_frames, 360);
    assert_eq!(config.video.crop, Some(CropRegion { x: 4, y: 8, size: 120 }));
    assert_eq!(config.geometry, PipelineConfig::default().geometry);
}

#[test]
fn test_json_file_with_invalid_values_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "geometry": {{ "dso": 900.0 }} }}"#).unwrap();

    let result = PipelineConfig::from_json_file(file.path());
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
}

#[test]
fn test_geometry_checks_agree_with_geometry_builder() {
    use crate::tomo_pipeline::geometry::build_geometry;

    for config in [
        PipelineConfig::builder().distances(456.0, 456.0).build(),
        PipelineConfig::builder().pixel_size(f64::NAN).build(),
        PipelineConfig::builder().image_size(0).build(),
    ] {
        let from_config = config.validate().unwrap_err().to_string();
        let from_builder = build_geometry(&config.geometry).unwrap_err().to_string();
        assert_eq!(from_config, from_builder);
        assert_eq!(config.geometry.validate().unwrap_err().to_string(), from_config);
    }
}
