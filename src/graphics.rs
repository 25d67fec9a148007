/// Mesh generation for the bodies of the scene
pub mod sphere;

pub use sphere::{MIN_RESOLUTION, SphereMesh, generate_sphere, sphere_vertex_count};
