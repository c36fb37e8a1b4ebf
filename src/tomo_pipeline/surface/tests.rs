use glam::Vec3;
use ndarray::{Array3, s};

use crate::tomo_pipeline::common::error::PipelineError;
use crate::tomo_pipeline::config::ReconstructionConfig;
use crate::tomo_pipeline::reconstruction::Volume;
use crate::tomo_pipeline::surface::{Mesh, SurfaceExtractor, marching_cubes};

/// `size`³ volume of zeros with a `side`³ cube of `value` starting at `start`.
fn block_volume(size: usize, start: usize, side: usize, value: f32) -> Volume {
    let mut data = Array3::zeros((size, size, size));
    data.slice_mut(s![start..start + side, start..start + side, start..start + side])
        .fill(value);
    Volume::from_array(data)
}

fn assert_unit_normals(mesh: &Mesh) {
    for normal in &mesh.normals {
        assert!((normal.length() - 1.0).abs() < 1e-5, "normal {normal:?} is not unit length");
    }
}

#[test]
fn test_interior_cube_is_watertight() {
    for side in [2usize, 3] {
        let volume = block_volume(8, 2, side, 10.0);
        let mesh = SurfaceExtractor::new(0.5).unwrap().extract(&volume).unwrap();

        // 2 crossings per grid line through the block, 3 axes
        let vertices = 6 * side * side;
        assert_eq!(mesh.num_vertices(), vertices);
        // closed genus-0 triangle mesh: F = 2V - 4
        assert_eq!(mesh.num_faces(), 2 * vertices - 4);
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());
        assert_unit_normals(&mesh);
        assert!(mesh.signed_volume() > 0.0, "faces must point outward");

        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::splat(1.5));
        assert_eq!(hi, Vec3::splat(2.0 + side as f32 - 0.5));
    }
}

#[test]
fn test_single_corner_normal_points_away_from_solid() {
    let mut field = Array3::zeros((2, 2, 2));
    field[[0, 0, 0]] = 1.0f32;

    let mesh = marching_cubes(field.view(), 0.5);

    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(mesh.num_vertices(), 3);
    let expected = Vec3::ONE.normalize();
    assert!((mesh.normals[0] - expected).length() < 1e-5);
    for vertex in &mesh.vertices {
        assert!((vertex.x + vertex.y + vertex.z - 0.5).abs() < 1e-6);
    }
}

#[test]
fn test_marching_cubes_needs_two_nodes_per_axis() {
    let field = Array3::<f32>::ones((1, 4, 4));
    assert!(marching_cubes(field.view(), 0.5).is_empty());
}

#[test]
fn test_border_block_closed_only_with_padding() {
    let volume = block_volume(6, 0, 3, 1.0);

    let closed = SurfaceExtractor::new(0.5).unwrap().extract(&volume).unwrap();
    assert!(closed.is_closed());
    assert_eq!(closed.num_vertices(), 54);
    // padding is undone, so the surface sits half a voxel outside the array
    assert_eq!(closed.bounds().unwrap().0, Vec3::splat(-0.5));

    let open = SurfaceExtractor::new(0.5)
        .unwrap()
        .with_close_boundary(false)
        .extract(&volume)
        .unwrap();
    assert!(!open.is_empty());
    assert!(!open.is_closed());
    assert!(open.num_faces() < closed.num_faces());
}

#[test]
fn test_uniform_volume_is_degenerate() {
    let volume = Volume::from_array(Array3::from_elem((4, 4, 4), 0.7));

    let result = SurfaceExtractor::new(0.4).unwrap().extract(&volume);

    match result {
        Err(PipelineError::DegenerateVolume { value }) => assert_eq!(value, 0.7),
        other => panic!("expected degenerate volume, got {other:?}"),
    }
}

#[test]
fn test_threshold_must_be_normalized() {
    assert!(matches!(SurfaceExtractor::new(1.2), Err(PipelineError::InvalidConfig(_))));
    assert!(matches!(SurfaceExtractor::new(-0.1), Err(PipelineError::InvalidConfig(_))));
    assert!(SurfaceExtractor::new(0.0).is_ok());
    assert!(SurfaceExtractor::new(1.0).is_ok());
}

#[test]
fn test_from_config_uses_threshold_and_padding() {
    let config = ReconstructionConfig {
        stl_threshold: 0.25,
        close_boundary: false,
        ..ReconstructionConfig::default()
    };
    let extractor = SurfaceExtractor::from_config(&config).unwrap();
    assert_eq!(extractor.threshold(), 0.25);

    let labels = extractor.binarize(&Array3::from_elem((3, 3, 3), 0.3));
    assert_eq!(labels.dim(), (3, 3, 3));
}

#[test]
fn test_higher_threshold_never_grows_the_solid() {
    // radial ramp: bright center fading outward
    let volume = Volume::from_array(Array3::from_shape_fn((12, 12, 12), |(z, y, x)| {
        let d = Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(5.5);
        -d.length()
    }));
    let normalized = SurfaceExtractor::normalize(&volume).unwrap();

    let mut previous = usize::MAX;
    for threshold in [0.2, 0.4, 0.6, 0.8] {
        let extractor = SurfaceExtractor::new(threshold).unwrap();
        let solid = extractor.binarize(&normalized).iter().filter(|v| **v > 0.0).count();
        assert!(solid <= previous);
        previous = solid;

        let mesh = extractor.extract(&volume).unwrap();
        assert!(!mesh.is_empty());
        assert!(mesh.is_valid());
    }
}

#[test]
fn test_threshold_one_gives_empty_mesh() {
    let volume = block_volume(5, 1, 2, 3.0);
    let mesh = SurfaceExtractor::new(1.0).unwrap().extract(&volume).unwrap();
    assert!(mesh.is_empty());
    assert!(mesh.is_valid());
}

#[test]
fn test_nan_voxels_count_as_empty() {
    let mut volume = block_volume(6, 1, 3, 2.0).into_array();
    volume[[2, 2, 2]] = f32::NAN;
    let normalized = SurfaceExtractor::normalize(&Volume::from_array(volume)).unwrap();

    let labels = SurfaceExtractor::new(0.5)
        .unwrap()
        .with_close_boundary(false)
        .binarize(&normalized);
    assert_eq!(labels[[2, 2, 2]], 0.0);
    assert_eq!(labels[[3, 3, 3]], 1.0);
}
