/// Procedural UV-sphere generation
/// Builds the unit sphere every body is cloned from
use glam::{DVec3, Vec2};
use std::f64::consts::PI;

use crate::{OrreryError, OrreryResult};

/// Smallest angular resolution that still closes into a solid
pub const MIN_RESOLUTION: u32 = 4;

/// CPU-side sphere geometry, centered at the origin with radius 1.
///
/// Layout: vertex 0 is the north pole (+Z), followed by `resolution - 2` latitude rings of
/// `resolution + 1` vertices each (the first and last vertex of a ring sit on the same
/// meridian so the texture seam does not wrap), and finally the south pole.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    pub resolution: u32,
    pub positions: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    pub tex_coords: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Index of the south pole vertex
    pub fn south_pole(&self) -> usize {
        self.positions.len().saturating_sub(1)
    }

    /// Structural checks that must hold before any GPU resource is created.
    pub fn validate(&self) -> OrreryResult<()> {
        if self.resolution < MIN_RESOLUTION {
            return Err(OrreryError::InvalidResolution(self.resolution));
        }

        let count = self.positions.len();
        let expected = sphere_vertex_count(self.resolution);
        if count != expected {
            return Err(OrreryError::InvalidMesh(format!(
                "{} vertices, resolution {} produces {}",
                count, self.resolution, expected
            )));
        }

        if self.normals.len() != count || self.tex_coords.len() != count {
            return Err(OrreryError::InvalidMesh(format!(
                "attribute lengths differ: {} positions, {} normals, {} texture coordinates",
                count,
                self.normals.len(),
                self.tex_coords.len()
            )));
        }

        if self.indices.len() % 3 != 0 {
            return Err(OrreryError::InvalidMesh(format!(
                "{} indices do not form whole triangles",
                self.indices.len()
            )));
        }

        if let Some((slot, index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, index)| **index as usize >= count)
        {
            return Err(OrreryError::InvalidMesh(format!(
                "index {} at slot {} is out of range for {} vertices",
                index, slot, count
            )));
        }

        Ok(())
    }
}

/// Number of vertices produced for a given resolution; 0 below `MIN_RESOLUTION`
pub fn sphere_vertex_count(resolution: u32) -> usize {
    if resolution < MIN_RESOLUTION {
        return 0;
    }
    let n = resolution as usize;
    (n - 2) * (n + 1) + 2
}

/// Generate a closed unit sphere.
///
/// Latitude runs from 0 at the north pole to PI at the south pole over `resolution` samples;
/// longitude runs from 0 to 2*PI over `resolution` steps.
pub fn generate_sphere(resolution: u32) -> OrreryResult<SphereMesh> {
    if resolution < MIN_RESOLUTION {
        return Err(OrreryError::InvalidResolution(resolution));
    }

    let n = resolution as usize;
    let rings = n - 2;
    let ring_len = n + 1;
    let vertex_count = sphere_vertex_count(resolution);

    let mut positions = Vec::with_capacity(vertex_count);
    let mut tex_coords = Vec::with_capacity(vertex_count);

    positions.push(DVec3::Z);
    tex_coords.push(Vec2::new(0.5, 0.0));

    for ring in 1..=rings {
        let theta = PI * ring as f64 / (n - 1) as f64;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let v = ring as f32 / (n - 1) as f32;

        for column in 0..ring_len {
            // The closing column reuses the first meridian exactly
            let phi = 2.0 * PI * (column % n) as f64 / n as f64;
            let (sin_phi, cos_phi) = phi.sin_cos();

            positions.push(DVec3::new(
                sin_theta * cos_phi,
                sin_theta * sin_phi,
                cos_theta,
            ));
            tex_coords.push(Vec2::new(column as f32 / n as f32, v));
        }
    }

    positions.push(DVec3::NEG_Z);
    tex_coords.push(Vec2::new(0.5, 1.0));

    let normals = positions.clone();
    let indices = sphere_indices(resolution);

    let mesh = SphereMesh {
        resolution,
        positions,
        normals,
        tex_coords,
        indices,
    };
    mesh.validate()?;

    log::debug!(
        "Generated sphere: resolution {}, {} vertices, {} triangles",
        resolution,
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    Ok(mesh)
}

/// Counter-clockwise (seen from outside) triangle list for the layout above
fn sphere_indices(resolution: u32) -> Vec<u32> {
    let n = resolution;
    let rings = n - 2;
    let ring_len = n + 1;
    let ring_start = |ring: u32| 1 + ring * ring_len;
    let south = 1 + rings * ring_len;

    let mut indices = Vec::with_capacity(6 * (n as usize) * (rings as usize));

    // North cap fans out from the pole
    for column in 0..n {
        let first = ring_start(0) + column;
        indices.extend_from_slice(&[0, first, first + 1]);
    }

    for ring in 0..rings - 1 {
        for column in 0..n {
            let upper = ring_start(ring) + column;
            let lower = ring_start(ring + 1) + column;

            indices.extend_from_slice(&[upper, lower, upper + 1]);
            indices.extend_from_slice(&[upper + 1, lower, lower + 1]);
        }
    }

    // The south fan is wound opposite to the north one: the pole faces -Z
    let last = ring_start(rings - 1);
    for column in 0..n {
        let first = last + column;
        indices.extend_from_slice(&[south, first + 1, first]);
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn test_rejects_low_resolution() {
        for resolution in 0..MIN_RESOLUTION {
            assert!(matches!(
                generate_sphere(resolution),
                Err(OrreryError::InvalidResolution(r)) if r == resolution
            ));
        }
    }

    #[rstest]
    #[case(4)]
    #[case(5)]
    #[case(16)]
    #[case(33)]
    fn test_vertex_and_index_counts(#[case] resolution: u32) {
        let mesh = generate_sphere(resolution).unwrap();
        let n = resolution as usize;

        assert_eq!(mesh.vertex_count(), (n - 2) * (n + 1) + 2);
        assert_eq!(mesh.vertex_count(), sphere_vertex_count(resolution));
        assert_eq!(mesh.triangle_count(), 2 * n * (n - 2));
        assert!(
            mesh.indices
                .iter()
                .all(|&index| (index as usize) < mesh.vertex_count())
        );
    }

    #[rstest]
    #[case(4)]
    #[case(16)]
    fn test_vertices_on_unit_sphere(#[case] resolution: u32) {
        let mesh = generate_sphere(resolution).unwrap();

        for (position, normal) in mesh.positions.iter().zip(&mesh.normals) {
            assert_abs_diff_eq!(position.length(), 1.0, epsilon = 1e-12);
            assert_eq!(position, normal);
        }
        assert_eq!(mesh.positions[0], DVec3::Z);
        assert_eq!(mesh.positions[mesh.south_pole()], DVec3::NEG_Z);
    }

    #[test]
    fn test_seam_is_duplicated() {
        let mesh = generate_sphere(8).unwrap();
        let ring_len = 9;

        for ring in 0..6 {
            let first = 1 + ring * ring_len;
            let last = first + ring_len - 1;
            assert_eq!(mesh.positions[first], mesh.positions[last]);
            assert_eq!(mesh.tex_coords[first].x, 0.0);
            assert_eq!(mesh.tex_coords[last].x, 1.0);
            assert_eq!(mesh.tex_coords[first].y, mesh.tex_coords[last].y);
        }

        assert_eq!(mesh.tex_coords[0], Vec2::new(0.5, 0.0));
        assert_eq!(mesh.tex_coords[mesh.south_pole()], Vec2::new(0.5, 1.0));
    }

    #[rstest]
    #[case(4)]
    #[case(12)]
    fn test_triangles_face_outward(#[case] resolution: u32) {
        let mesh = generate_sphere(resolution).unwrap();

        for triangle in mesh.indices.chunks_exact(3) {
            let a = mesh.positions[triangle[0] as usize];
            let b = mesh.positions[triangle[1] as usize];
            let c = mesh.positions[triangle[2] as usize];

            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                face_normal.dot(centroid) > 0.0,
                "triangle {:?} is wound inward",
                triangle
            );
        }
    }

    #[test]
    fn test_validate_catches_bad_index() {
        let mut mesh = generate_sphere(6).unwrap();
        let count = mesh.vertex_count() as u32;
        mesh.indices[4] = count;

        assert!(matches!(mesh.validate(), Err(OrreryError::InvalidMesh(_))));
    }

    #[test]
    fn test_vertex_count_below_minimum() {
        for resolution in 0..MIN_RESOLUTION {
            assert_eq!(sphere_vertex_count(resolution), 0);
        }
        assert_eq!(sphere_vertex_count(MIN_RESOLUTION), 12);
    }

    #[test]
    fn test_validate_rejects_empty_mesh() {
        let empty = SphereMesh {
            resolution: 0,
            positions: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            indices: Vec::new(),
        };
        assert!(matches!(
            empty.validate(),
            Err(OrreryError::InvalidResolution(0))
        ));

        // Claims a valid resolution but carries no vertices
        let hollow = SphereMesh {
            resolution: 8,
            ..empty
        };
        assert!(matches!(hollow.validate(), Err(OrreryError::InvalidMesh(_))));
    }

    #[test]
    fn test_validate_rejects_truncated_mesh() {
        let mut mesh = generate_sphere(6).unwrap();
        mesh.positions.pop();
        mesh.normals.pop();
        mesh.tex_coords.pop();
        mesh.indices.clear();
        assert!(matches!(mesh.validate(), Err(OrreryError::InvalidMesh(_))));
    }

    #[test]
    fn test_validate_catches_length_mismatch() {
        let mut mesh = generate_sphere(6).unwrap();
        mesh.normals.pop();
        assert!(matches!(mesh.validate(), Err(OrreryError::InvalidMesh(_))));

        let mut mesh = generate_sphere(6).unwrap();
        mesh.indices.pop();
        assert!(matches!(mesh.validate(), Err(OrreryError::InvalidMesh(_))));
    }
}
