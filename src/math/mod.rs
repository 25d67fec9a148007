pub mod body;
pub mod transform;

pub use body::*;

use glam::{DMat4, DVec3};

use crate::{OrreryError, OrreryResult};

pub const PI: f64 = std::f64::consts::PI;

/// Distance under which a pivot is considered to be the body's own center
pub const PIVOT_EPSILON: f64 = 1e-9;

/// Shortest axis accepted for a rotation
const MIN_AXIS_LENGTH: f64 = 1e-12;

/// Affine building blocks shared by scene setup and the transform engine
pub struct MathUtils;

impl MathUtils {
    /// Unit-length copy of `axis`, or an error when it has no usable direction
    pub fn normalized_axis(axis: DVec3) -> OrreryResult<DVec3> {
        if !axis.is_finite() || axis.length() < MIN_AXIS_LENGTH {
            return Err(OrreryError::DegenerateAxis);
        }
        Ok(axis.normalize())
    }

    /// Rotation of `angle` radians about `axis` through the origin
    pub fn rotation(axis: DVec3, angle: f64) -> OrreryResult<DMat4> {
        Ok(DMat4::from_axis_angle(Self::normalized_axis(axis)?, angle))
    }

    /// Rotation of `angle` radians about the line through `pivot` with direction `axis`
    pub fn rotation_about(pivot: DVec3, axis: DVec3, angle: f64) -> OrreryResult<DMat4> {
        if !angle.is_finite() {
            return Err(OrreryError::InvalidTransform(format!(
                "rotation angle {} is not finite",
                angle
            )));
        }
        if !pivot.is_finite() {
            return Err(OrreryError::InvalidTransform(format!(
                "rotation pivot {} is not finite",
                pivot
            )));
        }
        Ok(Self::translation(pivot) * Self::rotation(axis, angle)? * Self::translation(-pivot))
    }

    pub fn translation(offset: DVec3) -> DMat4 {
        DMat4::from_translation(offset)
    }

    /// Uniform scale followed by a move to `position`
    pub fn placement(size: f64, position: DVec3) -> DMat4 {
        DMat4::from_translation(position) * DMat4::from_scale(DVec3::splat(size))
    }

    /// Normal of an orbital plane tilted by `inclination` about the world Z axis
    pub fn orbit_normal(inclination: f64) -> DVec3 {
        let (sin, cos) = inclination.sin_cos();
        DVec3::new(-sin, cos, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_degenerate_axis_rejected() {
        assert!(matches!(
            MathUtils::normalized_axis(DVec3::ZERO),
            Err(OrreryError::DegenerateAxis)
        ));
        assert!(matches!(
            MathUtils::rotation(DVec3::new(f64::NAN, 1.0, 0.0), 1.0),
            Err(OrreryError::DegenerateAxis)
        ));

        let axis = MathUtils::normalized_axis(DVec3::new(0.0, 3.0, 4.0)).unwrap();
        assert_abs_diff_eq!(axis.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_rotation_rejected() {
        assert!(matches!(
            MathUtils::rotation_about(DVec3::ZERO, DVec3::Y, f64::NAN),
            Err(OrreryError::InvalidTransform(_))
        ));
        assert!(matches!(
            MathUtils::rotation_about(DVec3::ZERO, DVec3::Y, f64::INFINITY),
            Err(OrreryError::InvalidTransform(_))
        ));
        assert!(matches!(
            MathUtils::rotation_about(DVec3::new(0.0, f64::NAN, 0.0), DVec3::Y, 0.1),
            Err(OrreryError::InvalidTransform(_))
        ));
    }

    #[test]
    fn test_rotation_about_pivot() {
        let pivot = DVec3::new(2.0, 0.0, 0.0);
        let matrix = MathUtils::rotation_about(pivot, DVec3::Y, PI / 2.0).unwrap();

        // The pivot itself stays put
        assert!(matrix.transform_point3(pivot).abs_diff_eq(pivot, 1e-12));

        // Right-handed quarter turn about +Y sends +X to -Z
        let moved = matrix.transform_point3(DVec3::new(3.0, 0.0, 0.0));
        assert!(moved.abs_diff_eq(DVec3::new(2.0, 0.0, -1.0), 1e-12));
    }

    #[test]
    fn test_placement_scales_then_moves() {
        let matrix = MathUtils::placement(0.5, DVec3::new(10.0, 0.0, 0.0));
        let moved = matrix.transform_point3(DVec3::Z);
        assert!(moved.abs_diff_eq(DVec3::new(10.0, 0.0, 0.5), 1e-12));
    }

    #[test]
    fn test_orbit_normal() {
        assert!(MathUtils::orbit_normal(0.0).abs_diff_eq(DVec3::Y, 1e-12));

        let tilted = MathUtils::orbit_normal(0.3);
        assert_abs_diff_eq!(tilted.length(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(tilted.angle_between(DVec3::Y), 0.3, epsilon = 1e-12);

        // Same result as rotating +Y about +Z
        let rotated = MathUtils::rotation(DVec3::Z, 0.3)
            .unwrap()
            .transform_vector3(DVec3::Y);
        assert!(tilted.abs_diff_eq(rotated, 1e-12));
    }
}
