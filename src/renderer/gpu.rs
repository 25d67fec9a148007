/// wgpu implementation of the render backend
///
/// Buffers live in an arena indexed by handle. A vertex array is only bookkeeping: the five
/// attribute buffers, the index buffer and the body's texture bind group, bound together
/// when a draw target binds the array.
use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    OrreryError, OrreryResult,
    renderer::backend::{
        AttributeSlot, BufferHandle, DrawTarget, RenderBackend, VertexArrayHandle,
        VertexArrayLayout,
    },
};

struct GpuVertexArray {
    /// Indexed by attribute location
    vertex_buffers: [BufferHandle; 5],
    index_buffer: BufferHandle,
    index_count: u32,
}

pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: Vec<wgpu::Buffer>,
    vertex_arrays: Vec<GpuVertexArray>,
    textures: HashMap<VertexArrayHandle, wgpu::BindGroup>,
}

impl GpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            buffers: Vec::new(),
            vertex_arrays: Vec::new(),
            textures: HashMap::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Texture bind group drawn with a vertex array
    pub fn set_texture(&mut self, vertex_array: VertexArrayHandle, bind_group: wgpu::BindGroup) {
        self.textures.insert(vertex_array, bind_group);
    }

    /// Draw target recording into `pass`; arrays without a texture use `fallback_texture`
    pub fn pass<'a, 'p>(
        &'a self,
        pass: &'a mut wgpu::RenderPass<'p>,
        fallback_texture: &'a wgpu::BindGroup,
    ) -> GpuPass<'a, 'p> {
        GpuPass {
            pass,
            backend: self,
            fallback_texture,
            bound: None,
        }
    }

    fn buffer(&self, handle: BufferHandle) -> OrreryResult<&wgpu::Buffer> {
        self.buffers
            .get(handle.0 as usize)
            .ok_or_else(|| OrreryError::Graphics(format!("unknown buffer {:?}", handle)))
    }

    fn push_buffer(&mut self, buffer: wgpu::Buffer) -> OrreryResult<BufferHandle> {
        let id = u32::try_from(self.buffers.len())
            .map_err(|_| OrreryError::Graphics("buffer handles exhausted".to_string()))?;
        self.buffers.push(buffer);
        Ok(BufferHandle(id))
    }
}

impl RenderBackend for GpuBackend {
    fn create_vertex_buffer(
        &mut self,
        slot: AttributeSlot,
        data: &[u8],
    ) -> OrreryResult<BufferHandle> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", slot)),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        self.push_buffer(buffer)
    }

    fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> OrreryResult<()> {
        let buffer = self.buffer(handle)?;
        if data.len() as wgpu::BufferAddress > buffer.size() {
            return Err(OrreryError::Graphics(format!(
                "update of {:?} with {} bytes, buffer holds {}",
                handle,
                data.len(),
                buffer.size()
            )));
        }

        self.queue.write_buffer(buffer, 0, data);
        Ok(())
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> OrreryResult<BufferHandle> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.push_buffer(buffer)
    }

    fn create_vertex_array(
        &mut self,
        layout: &VertexArrayLayout,
    ) -> OrreryResult<VertexArrayHandle> {
        let mut vertex_buffers = [BufferHandle(0); 5];
        for slot in AttributeSlot::ALL {
            let handle = layout.buffer_for(slot).ok_or_else(|| {
                OrreryError::Graphics(format!("vertex array is missing a {:?} buffer", slot))
            })?;
            self.buffer(handle)?;
            vertex_buffers[slot.location() as usize] = handle;
        }
        self.buffer(layout.index_buffer)?;

        let id = u32::try_from(self.vertex_arrays.len())
            .map_err(|_| OrreryError::Graphics("vertex array handles exhausted".to_string()))?;
        self.vertex_arrays.push(GpuVertexArray {
            vertex_buffers,
            index_buffer: layout.index_buffer,
            index_count: layout.index_count,
        });
        Ok(VertexArrayHandle(id))
    }
}

/// Draw target over an open render pass. The pipeline and camera bind group must already be
/// set by the caller.
pub struct GpuPass<'a, 'p> {
    pass: &'a mut wgpu::RenderPass<'p>,
    backend: &'a GpuBackend,
    fallback_texture: &'a wgpu::BindGroup,
    bound: Option<VertexArrayHandle>,
}

impl DrawTarget for GpuPass<'_, '_> {
    fn bind_vertex_array(&mut self, handle: VertexArrayHandle) -> OrreryResult<()> {
        let array = self
            .backend
            .vertex_arrays
            .get(handle.0 as usize)
            .ok_or_else(|| OrreryError::Graphics(format!("unknown vertex array {:?}", handle)))?;

        for (location, buffer) in array.vertex_buffers.iter().enumerate() {
            let buffer = self.backend.buffer(*buffer)?;
            self.pass.set_vertex_buffer(location as u32, buffer.slice(..));
        }
        let index_buffer = self.backend.buffer(array.index_buffer)?;
        self.pass
            .set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        let texture = self
            .backend
            .textures
            .get(&handle)
            .unwrap_or(self.fallback_texture);
        self.pass.set_bind_group(1, texture, &[]);

        self.bound = Some(handle);
        Ok(())
    }

    fn draw_indexed_triangles(&mut self, index_count: u32) -> OrreryResult<()> {
        let handle = self
            .bound
            .ok_or_else(|| OrreryError::Graphics("draw without a bound vertex array".to_string()))?;
        let available = self
            .backend
            .vertex_arrays
            .get(handle.0 as usize)
            .map_or(0, |array| array.index_count);
        if index_count > available {
            return Err(OrreryError::Graphics(format!(
                "cannot draw {} indices from {:?} holding {}",
                index_count, handle, available
            )));
        }

        self.pass.draw_indexed(0..index_count, 0, 0..1);
        Ok(())
    }
}
