use std::io::Cursor;

use chrono::NaiveDate;
use glam::Vec3;
use ndarray::{Array2, Array3};

use crate::tomo_pipeline::common::error::PipelineError;
use crate::tomo_pipeline::common::timing::StageMillis;
use crate::tomo_pipeline::config::{
    FilterType, PipelineConfig, StlFormat, TiffCompression, VisualizationConfig,
};
use crate::tomo_pipeline::export::npy;
use crate::tomo_pipeline::export::preview::{
    first_frame_comparison_image, middle_slices_image, percentile_range, to_gray,
};
use crate::tomo_pipeline::export::{
    MeshExporter, NpyVolumeWriter, RunDirectory, RunReport, RunResults, StlWriter, TiffVolumeWriter,
    VolumeWriter,
};
use crate::tomo_pipeline::frames::FirstFrameSnapshot;
use crate::tomo_pipeline::reconstruction::Volume;
use crate::tomo_pipeline::surface::Mesh;

fn one_triangle() -> Mesh {
    Mesh {
        vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        faces: vec![[0, 1, 2]],
        normals: vec![Vec3::Z],
    }
}

fn f32_at(bytes: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

#[test]
fn test_binary_stl_layout() {
    let mut mesh = one_triangle();
    mesh.vertices.push(Vec3::new(1.0, 1.0, 2.0));
    mesh.faces.push([1, 3, 2]);
    mesh.normals.push(Vec3::new(0.0, 0.0, 1.0));

    let mut out = Vec::new();
    StlWriter::default().export_mesh(&mesh, &mut out).unwrap();

    assert_eq!(out.len(), 80 + 4 + 2 * 50);
    assert_eq!(u32::from_le_bytes(out[80..84].try_into().unwrap()), 2);
    // first facet: normal then vertices
    assert_eq!(f32_at(&out, 84 + 8), 1.0);
    assert_eq!(f32_at(&out, 84 + 12 + 12), 1.0);
    // second facet, second vertex is (1, 1, 2)
    let second = 84 + 50;
    assert_eq!(f32_at(&out, second + 24), 1.0);
    assert_eq!(f32_at(&out, second + 28), 1.0);
    assert_eq!(f32_at(&out, second + 32), 2.0);
    assert_eq!(&out[second + 48..second + 50], &[0, 0]);
}

#[test]
fn test_ascii_stl() {
    let mut out = Vec::new();
    StlWriter::new(StlFormat::Ascii)
        .export_mesh(&one_triangle(), &mut out)
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("solid turntable_ct\n"));
    assert!(text.trim_end().ends_with("endsolid turntable_ct"));
    assert_eq!(text.matches("facet normal").count(), 1);
    assert_eq!(text.matches("vertex").count(), 3);
    assert!(text.contains("facet normal 0e0 0e0 1e0"));
}

#[test]
fn test_stl_rejects_dangling_indices() {
    let mut mesh = one_triangle();
    mesh.faces[0] = [0, 1, 7];

    let result = StlWriter::default().export_mesh(&mesh, &mut Vec::new());
    assert!(matches!(result, Err(PipelineError::ExportError(_))));
}

#[test]
fn test_empty_mesh_is_a_valid_stl() {
    let mut out = Vec::new();
    StlWriter::default().export_mesh(&Mesh::default(), &mut out).unwrap();
    assert_eq!(out.len(), 84);
    assert_eq!(&out[80..84], &[0, 0, 0, 0]);
}

#[test]
fn test_tiff_volume_has_one_page_per_slice() {
    let volume = Volume::from_array(Array3::from_shape_fn((3, 4, 5), |(z, y, x)| {
        (z * 100 + y * 10 + x) as f32
    }));

    for compression in [TiffCompression::None, TiffCompression::DeflateBalanced] {
        let mut out = Vec::new();
        TiffVolumeWriter::new(compression)
            .write_volume(&volume, &mut out)
            .unwrap();

        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(out)).unwrap();
        let mut pages = 0;
        loop {
            assert_eq!(decoder.dimensions().unwrap(), (5, 4));
            match decoder.read_image().unwrap() {
                tiff::decoder::DecodingResult::F32(pixels) => {
                    assert_eq!(pixels[0], (pages * 100) as f32);
                    assert_eq!(pixels[19], (pages * 100 + 34) as f32);
                }
                _ => panic!("expected float pixels"),
            }
            pages += 1;
            if !decoder.more_images() {
                break;
            }
            decoder.next_image().unwrap();
        }
        assert_eq!(pages, 3);
    }
}

#[test]
fn test_npy_volume_writer() {
    let volume = Volume::from_array(Array3::from_elem((2, 3, 4), 0.25));
    let mut out = Vec::new();
    NpyVolumeWriter.write_volume(&volume, &mut out).unwrap();

    let back = npy::read_array3(&mut Cursor::new(out)).unwrap();
    assert_eq!(back, *volume.as_array());
}

#[test]
fn test_percentile_range() {
    let values: Vec<f32> = (0..=100).map(|v| v as f32).collect();
    assert_eq!(percentile_range(&values, (1.0, 99.0)), Some((1.0, 99.0)));
    assert_eq!(percentile_range(&values, (0.0, 100.0)), Some((0.0, 100.0)));

    let with_nan = [f32::NAN, 3.0, 1.0];
    assert_eq!(percentile_range(&with_nan, (0.0, 100.0)), Some((1.0, 3.0)));
    assert_eq!(percentile_range(&[f32::NAN], (1.0, 99.0)), None);
}

#[test]
fn test_to_gray_clamps_to_window() {
    let data = Array2::from_shape_vec((1, 4), vec![-1.0, 0.0, 0.5, 2.0]).unwrap();
    let image = to_gray(data.view(), (0.0, 1.0));

    let levels: Vec<u8> = image.pixels().map(|p| p.0[0]).collect();
    assert_eq!(levels, vec![0, 0, 128, 255]);

    let flat = to_gray(data.view(), (1.0, 1.0));
    assert!(flat.pixels().all(|p| p.0[0] == 0));
}

#[test]
fn test_middle_slices_layout() {
    let mut data = Array3::zeros((4, 6, 8));
    data[[2, 3, 4]] = 1.0;
    let config = VisualizationConfig {
        auto_contrast: false,
        ..VisualizationConfig::default()
    };

    let image = middle_slices_image(&Volume::from_array(data), &config).unwrap();

    // tiles: (6x8), (4x8), (4x6) as rows x cols
    assert_eq!(image.dimensions(), (8 + 8 + 6, 6));
    // the bright voxel lies on every centre slice
    assert_eq!(image.get_pixel(4, 3).0[0], 255);
    assert_eq!(image.get_pixel(8 + 4, 2).0[0], 255);
    assert_eq!(image.get_pixel(16 + 3, 2).0[0], 255);
    assert_eq!(image.get_pixel(0, 0).0[0], 0);
}

#[test]
fn test_first_frame_comparison_dimensions() {
    let snapshot = FirstFrameSnapshot {
        raw: image::RgbImage::from_pixel(40, 20, image::Rgb([200, 10, 10])),
        projection: Array2::from_shape_fn((10, 10), |(r, _)| r as f32),
    };

    let image = first_frame_comparison_image(&snapshot);

    assert_eq!(image.dimensions(), (20 + 10, 10));
    assert_eq!(image.get_pixel(21, 0).0, [0, 0, 0]);
    assert_eq!(image.get_pixel(21, 9).0, [255, 255, 255]);
}

#[test]
fn test_run_directory_layout_and_report() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .filter(FilterType::Hann)
        .stl_threshold(0.4)
        .apply_circular_mask(false)
        .build();
    let stamp = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(14, 5, 7)
        .unwrap();

    let run = RunDirectory::create_at(tmp.path(), "mug", &config, stamp).unwrap();

    assert_eq!(
        run.path().file_name().unwrap().to_str().unwrap(),
        "mug_hann_0.4_maskFalse_20240309_140507"
    );
    assert!(run.model_dir().is_dir());
    assert_eq!(run.mesh_path("stl"), run.model_dir().join("mug.stl"));
    assert_eq!(run.volume_path("tiff"), run.model_dir().join("reconstruction.tiff"));

    let started = RunReport::started("frames/mug", &config);
    run.write_report(&started).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run.report_path()).unwrap()).unwrap();
    assert_eq!(json["status"], "started");
    assert_eq!(json["config"]["reconstruction"]["filter"], "hann");
    assert!(json.get("faces").is_none());

    let report = started.completed(RunResults {
        projections: 4,
        volume_shape: [8, 8, 8],
        vertices: 24,
        faces: 44,
        stage_millis: vec![StageMillis { stage: "build_stack", millis: 1.5, ok: true }],
    });
    run.write_report(&report).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(run.report_path()).unwrap()).unwrap();
    assert_eq!(json["source"], "frames/mug");
    assert_eq!(json["status"], "completed");
    assert_eq!(json["faces"], 44);
    assert_eq!(json["volume_shape"][2], 8);
    assert_eq!(json["config"]["reconstruction"]["filter"], "hann");
    assert_eq!(json["config"]["reconstruction"]["apply_circular_mask"], false);
}
