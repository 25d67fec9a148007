/// Graphics rendering using wgpu
/// Bodies reach the GPU through the `RenderBackend` seam; this module owns the surface,
/// depth target, camera uniform and per-body textures around it
pub mod backend;
pub mod camera;
pub mod core;
pub mod gpu;
pub mod memory;
pub mod pipeline;
pub mod submission;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use wgpu::{Surface, SurfaceConfiguration};
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    OrreryError, OrreryResult, assets::AssetManager, assets::TextureAsset,
    simulation::SolarSystem,
};

pub use backend::{
    AttributeSlot, BufferHandle, DrawTarget, RenderBackend, VertexArrayHandle, VertexArrayLayout,
};
pub use camera::Camera;
pub use self::core::*;
pub use gpu::GpuBackend;
pub use memory::MemoryBackend;
pub use pipeline::BodyPipeline;
pub use submission::MeshBuffers;

pub struct Renderer {
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    backend: GpuBackend,
    pipeline: BodyPipeline,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    fallback_texture: wgpu::BindGroup,

    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,

    wireframe: bool,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, assets: &mut AssetManager) -> OrreryResult<Self> {
        log::info!("Initializing wgpu renderer...");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .map_err(|e| OrreryError::Graphics(format!("Failed to create surface: {}", e)))?;

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::warn!("No primary adapter found ({}), trying fallback", e);
                instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::default(),
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: true,
                    })
                    .await
                    .map_err(|e| {
                        OrreryError::Graphics(format!("Failed to find a GPU adapter: {}", e))
                    })?
            }
        };

        log::info!("Using GPU: {}", adapter.get_info().name);

        let line_mode = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if line_mode {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Orrery Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| OrreryError::Graphics(format!("Failed to create device: {}", e)))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| OrreryError::Graphics("Surface reports no formats".to_string()))?;

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        let (depth_texture, depth_view) =
            create_depth_texture(&device, surface_config.width, surface_config.height);

        let pipeline = BodyPipeline::new(&device, surface_format, line_mode);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::from_camera(&Camera::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &pipeline.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Body Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = assets.white_texture(&device, &queue);
        let fallback_texture =
            Self::texture_bind_group(&device, &pipeline, &sampler, &white, "Fallback Texture");

        log::info!(
            "Renderer ready ({}x{}, {:?}, wireframe {})",
            surface_config.width,
            surface_config.height,
            surface_format,
            if line_mode { "available" } else { "unavailable" }
        );

        Ok(Self {
            surface,
            surface_config,
            backend: GpuBackend::new(device, queue),
            pipeline,
            camera_buffer,
            camera_bind_group,
            sampler,
            fallback_texture,
            _depth_texture: depth_texture,
            depth_view,
            wireframe: false,
        })
    }

    fn texture_bind_group(
        device: &wgpu::Device,
        pipeline: &BodyPipeline,
        sampler: &wgpu::Sampler,
        texture: &TextureAsset,
        label: &str,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// The backend bodies attach to and push through
    pub fn backend_mut(&mut self) -> &mut GpuBackend {
        &mut self.backend
    }

    /// Bind each attached body's texture. Bodies must be attached first.
    pub fn register_textures(
        &mut self,
        system: &SolarSystem,
        assets: &mut AssetManager,
    ) -> OrreryResult<()> {
        for (id, name) in system.textures() {
            let body = system.body(id)?;
            let Some(buffers) = body.mesh_buffers() else {
                return Err(OrreryError::Graphics(format!(
                    "body {} has no GPU buffers for texture {}",
                    id.0, name
                )));
            };

            let texture = assets.texture(self.backend.device(), self.backend.queue(), name);
            let bind_group = Self::texture_bind_group(
                self.backend.device(),
                &self.pipeline,
                &self.sampler,
                &texture,
                name,
            );
            self.backend.set_texture(buffers.vertex_array, bind_group);
            log::debug!("Bound texture {} to body {}", name, id.0);
        }

        let (images, textures) = assets.cache_stats();
        log::info!("Loaded {} images into {} textures", images, textures);
        Ok(())
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface
            .configure(self.backend.device(), &self.surface_config);

        let (depth_texture, depth_view) =
            create_depth_texture(self.backend.device(), new_size.width, new_size.height);
        self._depth_texture = depth_texture;
        self.depth_view = depth_view;

        log::debug!("Resized to {}x{}", new_size.width, new_size.height);
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.surface_config.width, self.surface_config.height)
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        if wireframe && !self.pipeline.supports_wireframe() {
            log::warn!("Wireframe mode is not supported by this GPU");
            return;
        }
        self.wireframe = wireframe;
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn render(&mut self, camera: &Camera, system: &SolarSystem) -> OrreryResult<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface
                    .configure(self.backend.device(), &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => {
                return Err(OrreryError::Graphics(format!(
                    "Failed to acquire frame: {}",
                    e
                )));
            }
        };

        self.backend.queue().write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform::from_camera(camera)),
        );

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.backend
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Body Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(self.pipeline.select(self.wireframe));
            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            let mut target = self.backend.pass(&mut pass, &self.fallback_texture);
            system.render(&mut target)?;
        }

        self.backend.queue().submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
