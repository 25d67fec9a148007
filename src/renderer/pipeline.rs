/// Body shading pipeline
/// One render pipeline reading the five per-vertex attribute buffers, plus an optional
/// line-mode twin for wireframe display
use wgpu::{BindGroupLayout, Device, RenderPipeline};

use crate::renderer::{backend::AttributeSlot, core::DEPTH_FORMAT};

const BODY_SHADER: &str = include_str!(concat!(env!("OUT_DIR"), "/shaders/body.wgsl"));

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const LIGHT_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];
const AMBIENCE_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![3 => Float32x3];
const TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![4 => Float32x2];

fn attributes(slot: AttributeSlot) -> &'static [wgpu::VertexAttribute] {
    match slot {
        AttributeSlot::Position => &POSITION_ATTRIBUTES,
        AttributeSlot::Normal => &NORMAL_ATTRIBUTES,
        AttributeSlot::Light => &LIGHT_ATTRIBUTES,
        AttributeSlot::Ambience => &AMBIENCE_ATTRIBUTES,
        AttributeSlot::TexCoord => &TEX_COORD_ATTRIBUTES,
    }
}

/// One vertex buffer per attribute slot, in location order
fn vertex_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 5] {
    AttributeSlot::ALL.map(|slot| wgpu::VertexBufferLayout {
        array_stride: slot.stride() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: attributes(slot),
    })
}

pub struct BodyPipeline {
    fill: RenderPipeline,
    wireframe: Option<RenderPipeline>,
    pub camera_bind_group_layout: BindGroupLayout,
    pub texture_bind_group_layout: BindGroupLayout,
}

impl BodyPipeline {
    /// `line_mode` must only be set when the device was created with `POLYGON_MODE_LINE`
    pub fn new(device: &Device, color_format: wgpu::TextureFormat, line_mode: bool) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Body Shader"),
            source: wgpu::ShaderSource::Wgsl(BODY_SHADER.into()),
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Body Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let build = |polygon_mode: wgpu::PolygonMode, label: &str| {
            let buffers = vertex_buffer_layouts();
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                cache: None,
                multiview: None,
            })
        };

        let fill = build(wgpu::PolygonMode::Fill, "Body Fill Pipeline");
        let wireframe = line_mode.then(|| build(wgpu::PolygonMode::Line, "Body Wireframe Pipeline"));

        Self {
            fill,
            wireframe,
            camera_bind_group_layout,
            texture_bind_group_layout,
        }
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe.is_some()
    }

    /// Wireframe pipeline when requested and available, fill otherwise
    pub fn select(&self, wireframe: bool) -> &RenderPipeline {
        match (&self.wireframe, wireframe) {
            (Some(line), true) => line,
            _ => &self.fill,
        }
    }
}
