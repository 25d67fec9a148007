/// Orbital transform engine
///
/// Every operation builds one composite matrix, applies it to all vertices and to the body's
/// own center, then recomputes normals and light vectors. Angles are incremental: the only
/// orbital state is the accumulated vertex positions themselves.
use glam::{DMat4, DVec3};

use crate::{
    OrreryError, OrreryResult,
    math::{Body, MathUtils, PIVOT_EPSILON},
};

impl Body {
    /// Apply an arbitrary affine transform. Used for one-time placement; never brackets tilt.
    pub fn move_by(&mut self, matrix: DMat4) -> OrreryResult<()> {
        if !matrix.is_finite() {
            return Err(OrreryError::InvalidTransform(
                "matrix has non-finite entries".to_string(),
            ));
        }
        self.apply(&matrix);
        Ok(())
    }

    /// Rotate by `angle` radians about the line through `pivot` with direction `axis`.
    ///
    /// When the pivot is another point than the body's own center and the body is tilted,
    /// the revolution runs in the untilted frame: the tilt is removed about the Z axis through
    /// the current center, the body is revolved, and the tilt is put back about the Z axis
    /// through the new center. The spin axis therefore keeps its direction instead of
    /// precessing with the orbit.
    pub fn rotate_around(&mut self, pivot: DVec3, axis: DVec3, angle: f64) -> OrreryResult<()> {
        let matrix = self.rotation_matrix(pivot, axis, angle)?;
        log::trace!(
            "rotate_around pivot ({:.3}, {:.3}, {:.3}) angle {:.5}",
            pivot.x,
            pivot.y,
            pivot.z,
            angle
        );
        self.apply(&matrix);
        Ok(())
    }

    /// Revolve around another body's current center
    pub fn rotate_around_body(&mut self, other: &Body, axis: DVec3, angle: f64) -> OrreryResult<()> {
        self.rotate_around(other.self_center(), axis, angle)
    }

    /// Spin about the body's own center
    pub fn spin(&mut self, axis: DVec3, angle: f64) -> OrreryResult<()> {
        self.rotate_around(self.self_center, axis, angle)
    }

    /// Whether a rotation about `pivot` is a revolution that must be tilt-bracketed
    pub fn brackets_tilt(&self, pivot: DVec3) -> bool {
        self.axial_tilt != 0.0 && !pivot.abs_diff_eq(self.self_center, PIVOT_EPSILON)
    }

    /// Composite matrix `rotate_around` would apply, without applying it
    pub fn rotation_matrix(&self, pivot: DVec3, axis: DVec3, angle: f64) -> OrreryResult<DMat4> {
        let revolution = MathUtils::rotation_about(pivot, axis, angle)?;
        if !self.brackets_tilt(pivot) {
            return Ok(revolution);
        }

        let center = self.self_center;
        let moved_center = revolution.transform_point3(center);

        let untilt = MathUtils::rotation_about(center, DVec3::Z, -self.axial_tilt)?;
        let retilt = MathUtils::rotation_about(moved_center, DVec3::Z, self.axial_tilt)?;

        Ok(retilt * revolution * untilt)
    }

    fn apply(&mut self, matrix: &DMat4) {
        for position in &mut self.positions {
            *position = matrix.transform_point3(*position);
        }
        self.self_center = matrix.transform_point3(self.self_center);
        self.refresh_derived();
    }
}
