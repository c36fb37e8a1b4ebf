use tracing::{debug, instrument};

use crate::tomo_pipeline::common::error::Result;
use crate::tomo_pipeline::config::GeometryConfig;
use crate::tomo_pipeline::geometry::types::{AngleSequence, Geometry, GeometryMode};

const DEFAULT_ACCURACY: f64 = 0.5;

/// Derives the cone-beam geometry from configuration.
///
/// The volume is `image_size` voxels per axis with a physical size of
/// `image_size`, so the voxel spacing is exactly 1. The detector is
/// `detector_size` pixels per axis at `pixel_size` pitch. Offsets are zero.
#[instrument(skip(config), fields(image_size = config.image_size, detector_size = config.detector_size))]
pub fn build_geometry(config: &GeometryConfig) -> Result<Geometry> {
    config.validate()?;

    let n_voxel = [config.image_size; 3];
    let s_voxel = [config.image_size as f64; 3];
    let d_voxel = [
        s_voxel[0] / n_voxel[0] as f64,
        s_voxel[1] / n_voxel[1] as f64,
        s_voxel[2] / n_voxel[2] as f64,
    ];

    let n_detector = [config.detector_size; 2];
    let d_detector = [config.pixel_size; 2];
    let s_detector = [
        n_detector[0] as f64 * d_detector[0],
        n_detector[1] as f64 * d_detector[1],
    ];

    let geometry = Geometry {
        dsd: config.dsd,
        dso: config.dso,
        n_voxel,
        s_voxel,
        d_voxel,
        n_detector,
        d_detector,
        s_detector,
        off_origin: [0.0; 3],
        off_detector: [0.0; 2],
        mode: GeometryMode::Cone,
        accuracy: DEFAULT_ACCURACY,
    };
    debug!(magnification = geometry.magnification(), "Geometry ready");
    Ok(geometry)
}

/// One angle per projection over a full turn, both ends included.
pub fn build_angles(count: usize) -> AngleSequence {
    AngleSequence::full_turn(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tomo_pipeline::common::error::PipelineError;
    use std::f64::consts::PI;

    #[test]
    fn test_geometry_derivation() {
        let config = GeometryConfig {
            image_size: 150,
            detector_size: 120,
            dsd: 398.0,
            dso: 278.0,
            pixel_size: 0.5,
        };
        let geometry = build_geometry(&config).unwrap();

        assert_eq!(geometry.n_voxel, [150, 150, 150]);
        assert_eq!(geometry.s_voxel, [150.0, 150.0, 150.0]);
        assert_eq!(geometry.d_voxel, [1.0, 1.0, 1.0]);
        assert_eq!(geometry.n_detector, [120, 120]);
        assert_eq!(geometry.d_detector, [0.5, 0.5]);
        assert_eq!(geometry.s_detector, [60.0, 60.0]);
        assert_eq!(geometry.off_origin, [0.0; 3]);
        assert_eq!(geometry.off_detector, [0.0; 2]);
        assert_eq!(geometry.mode, GeometryMode::Cone);
        assert_eq!(geometry.dsd, 398.0);
        assert_eq!(geometry.dso, 278.0);
        assert_eq!(geometry.detector_shape(), (120, 120));
        assert_eq!(geometry.volume_shape(), (150, 150, 150));
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        let mut config = GeometryConfig::default();
        config.dso = config.dsd;
        assert!(matches!(build_geometry(&config), Err(PipelineError::InvalidConfig(_))));

        let mut config = GeometryConfig::default();
        config.pixel_size = 0.0;
        assert!(matches!(build_geometry(&config), Err(PipelineError::InvalidConfig(_))));

        let mut config = GeometryConfig::default();
        config.image_size = 0;
        assert!(matches!(build_geometry(&config), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_four_angles_include_both_ends() {
        let angles = build_angles(4);
        let expected = [0.0, 2.0 * PI / 3.0, 4.0 * PI / 3.0, 2.0 * PI];

        assert_eq!(angles.len(), 4);
        for (got, want) in angles.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{got} != {want}");
        }
        assert_eq!(angles.as_slice()[3], 2.0 * PI);
    }

    #[test]
    fn test_angles_are_uniform_and_span_full_turn() {
        let angles = build_angles(800);
        let values = angles.as_slice();
        let step = 2.0 * PI / 799.0;

        assert_eq!(values.len(), 800);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[799], 2.0 * PI);
        for pair in values.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_angle_counts() {
        assert!(build_angles(0).is_empty());
        assert_eq!(build_angles(1).as_slice(), &[0.0]);
        assert_eq!(build_angles(2).as_slice(), &[0.0, 2.0 * PI]);
    }
}
