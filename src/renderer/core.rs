/// Frame-level GPU state shared by the pipeline and the renderer: camera uniform layout,
/// depth target and clear colour
use crate::renderer::camera::Camera;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_projection_matrix: [[f32; 4]; 4], // 64 bytes
    pub camera_position: [f32; 3],             // 12 bytes
    pub _padding: f32,                         // 4 bytes
} // Total: 80 bytes

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_projection_matrix: camera
                .view_projection_matrix()
                .as_mat4()
                .to_cols_array_2d(),
            camera_position: camera.position().as_vec3().to_array(),
            _padding: 0.0,
        }
    }
}

pub fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

    (depth_texture, depth_view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_uniform_layout() {
        // Must match the WGSL struct: mat4x4 followed by a vec3 padded to 16 bytes
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }

    #[test]
    fn test_camera_uniform_from_camera() {
        let camera = Camera::default();
        let uniform = CameraUniform::from_camera(&camera);

        assert_eq!(uniform.camera_position, [0.0, 10.0, 30.0]);
        assert_eq!(
            uniform.view_projection_matrix,
            camera.view_projection_matrix().as_mat4().to_cols_array_2d()
        );
    }
}
