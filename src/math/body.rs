/// Per-body mesh state: the body's own pivot, its permanent tilt and the vertex attributes
/// that the transform engine keeps consistent with the sun
use glam::{DVec3, Vec2, Vec3};

use crate::{
    OrreryError, OrreryResult,
    graphics::SphereMesh,
    math::{MathUtils, PI},
    renderer::submission::MeshBuffers,
};

/// Exponent of the inverse-distance dimming applied to light vectors.
/// Distant planets come out only slightly darker.
pub const DEFAULT_ATTENUATION_EXPONENT: f64 = 0.05;

/// The fixed point every body is lit from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: DVec3,
    pub attenuation_exponent: f64,
}

impl LightSource {
    pub fn new(position: DVec3, attenuation_exponent: f64) -> Self {
        Self {
            position,
            attenuation_exponent,
        }
    }

    /// Direction from `point` toward the light, scaled by `distance^-k`.
    /// `None` when the point coincides with the light.
    pub fn light_at(&self, point: DVec3) -> Option<DVec3> {
        let offset = self.position - point;
        let distance = offset.length();
        if !distance.is_finite() || distance <= f64::EPSILON {
            return None;
        }

        Some(offset / distance * distance.powf(-self.attenuation_exponent))
    }
}

impl Default for LightSource {
    fn default() -> Self {
        Self::new(DVec3::ZERO, DEFAULT_ATTENUATION_EXPONENT)
    }
}

/// A renderable celestial object (sun, planet or moon)
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) self_center: DVec3,
    pub(crate) axial_tilt: f64,
    pub(crate) luminous: bool,
    pub(crate) light_source: LightSource,

    pub(crate) positions: Vec<DVec3>,
    pub(crate) normals: Vec<DVec3>,
    pub(crate) light: Vec<DVec3>,
    pub(crate) ambience: Vec<Vec3>,
    pub(crate) tex_coords: Vec<Vec2>,
    pub(crate) indices: Vec<u32>,

    /// Backend buffers, present once the body has been attached
    pub(crate) buffers: Option<MeshBuffers>,
    /// Positions, normals or light changed since the last submit
    pub(crate) dirty: bool,
}

impl Body {
    /// Create an unlit body from a generated sphere, centered where the sphere is (the origin)
    pub fn from_sphere(mesh: &SphereMesh, light_source: LightSource) -> OrreryResult<Self> {
        mesh.validate()?;

        let count = mesh.vertex_count();
        let mut body = Self {
            self_center: DVec3::ZERO,
            axial_tilt: 0.0,
            luminous: false,
            light_source,
            positions: mesh.positions.clone(),
            normals: mesh.normals.clone(),
            light: vec![DVec3::ZERO; count],
            ambience: vec![Vec3::ZERO; count],
            tex_coords: mesh.tex_coords.clone(),
            indices: mesh.indices.clone(),
            buffers: None,
            dirty: true,
        };
        body.refresh_derived();

        Ok(body)
    }

    /// Mark the body as self-luminous: full ambient factor on every vertex.
    /// Must run before the body is attached; ambience is uploaded once.
    pub fn setup_sun(&mut self) {
        if self.buffers.is_some() {
            log::warn!("setup_sun called on an attached body; ambience will not be re-uploaded");
        }

        self.luminous = true;
        self.ambience.fill(Vec3::ONE);
    }

    /// One-time orientation of a planet placed on the +X side of the sun.
    ///
    /// The order matters, each step is expressed in the frame left by the previous one:
    /// pole onto the orbital-plane normal, permanent tilt, orbital-plane inclination,
    /// then the starting phase along the inclined orbit.
    pub fn setup_planet(
        &mut self,
        axial_tilt: f64,
        orbit_phase: f64,
        orbit_inclination: f64,
    ) -> OrreryResult<()> {
        let center = self.self_center;
        let sun = self.light_source.position;

        // Generator pole (+Z) onto the untilted orbital-plane normal (+Y)
        self.rotate_around(center, DVec3::X, -PI / 2.0)?;

        self.rotate_around(center, DVec3::Z, axial_tilt)?;
        self.axial_tilt = axial_tilt;

        self.rotate_around(sun, DVec3::Z, orbit_inclination)?;
        self.rotate_around(sun, MathUtils::orbit_normal(orbit_inclination), orbit_phase)?;

        log::debug!(
            "Planet set up: tilt {:.3}, phase {:.3}, inclination {:.3}, center ({:.2}, {:.2}, {:.2})",
            axial_tilt,
            orbit_phase,
            orbit_inclination,
            self.self_center.x,
            self.self_center.y,
            self.self_center.z
        );

        Ok(())
    }

    pub fn self_center(&self) -> DVec3 {
        self.self_center
    }

    pub fn axial_tilt(&self) -> f64 {
        self.axial_tilt
    }

    pub fn is_luminous(&self) -> bool {
        self.luminous
    }

    pub fn light_source(&self) -> &LightSource {
        &self.light_source
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[DVec3] {
        &self.normals
    }

    pub fn light(&self) -> &[DVec3] {
        &self.light
    }

    pub fn ambience(&self) -> &[Vec3] {
        &self.ambience
    }

    pub fn tex_coords(&self) -> &[Vec2] {
        &self.tex_coords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The generator's north pole; it stays on the spin axis through every transform
    pub fn north_pole(&self) -> OrreryResult<DVec3> {
        self.positions
            .first()
            .copied()
            .ok_or_else(|| OrreryError::InvalidMesh("body has no vertices".to_string()))
    }

    /// Current direction of the body's spin axis
    pub fn spin_axis(&self) -> OrreryResult<DVec3> {
        MathUtils::normalized_axis(self.north_pole()? - self.self_center)
    }

    /// Angle between the spin axis and the given orbital-plane normal
    pub fn tilt_relative_to(&self, orbit_normal: DVec3) -> OrreryResult<f64> {
        let normal = MathUtils::normalized_axis(orbit_normal)?;
        Ok(self.spin_axis()?.angle_between(normal))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Recompute normals and light vectors from the current positions.
    /// A vertex sitting on the center (or on the sun) keeps its previous value.
    pub(crate) fn refresh_derived(&mut self) {
        let center = self.self_center;
        let light_source = self.light_source;

        for ((position, normal), light) in self
            .positions
            .iter()
            .zip(self.normals.iter_mut())
            .zip(self.light.iter_mut())
        {
            if let Some(direction) = (*position - center).try_normalize() {
                *normal = direction;
            }
            if let Some(toward_sun) = light_source.light_at(*position) {
                *light = toward_sun;
            }
        }

        self.dirty = true;
    }

    /// Length and index checks over the live attribute arrays
    pub fn validate(&self) -> OrreryResult<()> {
        let count = self.positions.len();
        let lengths = [
            self.normals.len(),
            self.light.len(),
            self.ambience.len(),
            self.tex_coords.len(),
        ];
        if lengths.iter().any(|&len| len != count) {
            return Err(OrreryError::InvalidMesh(format!(
                "attribute lengths {:?} do not match {} positions",
                lengths, count
            )));
        }

        if self.indices.len() % 3 != 0 || self.indices.iter().any(|&i| i as usize >= count) {
            return Err(OrreryError::InvalidMesh(
                "triangle indices do not fit the vertex arrays".to_string(),
            ));
        }

        Ok(())
    }
}
