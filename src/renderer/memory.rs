/// In-memory render backend
/// Keeps every buffer as plain bytes and records draws. Used for headless runs and by tests.
use glam::Vec3;

use crate::{
    OrreryError, OrreryResult,
    renderer::backend::{
        AttributeSlot, BufferHandle, DrawTarget, RenderBackend, VertexArrayHandle,
        VertexArrayLayout,
    },
};

#[derive(Debug, Clone, PartialEq)]
enum BufferKind {
    Vertex(AttributeSlot),
    Index,
}

#[derive(Debug, Clone)]
struct StoredBuffer {
    kind: BufferKind,
    data: Vec<u8>,
    updates: usize,
}

/// One recorded indexed draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub vertex_array: VertexArrayHandle,
    pub index_count: u32,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    buffers: Vec<StoredBuffer>,
    vertex_arrays: Vec<VertexArrayLayout>,
    bound: Option<VertexArrayHandle>,
    draws: Vec<DrawCall>,
    failing: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail, as a lost GPU device would
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn vertex_buffer_count(&self) -> usize {
        self.buffers
            .iter()
            .filter(|b| matches!(b.kind, BufferKind::Vertex(_)))
            .count()
    }

    pub fn index_buffer_count(&self) -> usize {
        self.buffers
            .iter()
            .filter(|b| b.kind == BufferKind::Index)
            .count()
    }

    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Total number of buffer replacements since creation
    pub fn update_count(&self) -> usize {
        self.buffers.iter().map(|b| b.updates).sum()
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Forget recorded draws, typically at the start of a frame
    pub fn clear_draws(&mut self) {
        self.draws.clear();
        self.bound = None;
    }

    pub fn buffer_data(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(handle.0 as usize).map(|b| b.data.as_slice())
    }

    /// Decode a three-component attribute buffer
    pub fn read_vec3(&self, handle: BufferHandle) -> Option<Vec<Vec3>> {
        let data = self.buffer_data(handle)?;
        Some(
            data.chunks_exact(std::mem::size_of::<Vec3>())
                .map(bytemuck::pod_read_unaligned::<Vec3>)
                .collect(),
        )
    }

    pub fn layout(&self, handle: VertexArrayHandle) -> Option<&VertexArrayLayout> {
        self.vertex_arrays.get(handle.0 as usize)
    }

    fn check(&self, operation: &str) -> OrreryResult<()> {
        if self.failing {
            return Err(OrreryError::Graphics(format!("{} failed: device lost", operation)));
        }
        Ok(())
    }

    fn push_buffer(&mut self, kind: BufferKind, data: Vec<u8>) -> OrreryResult<BufferHandle> {
        let id = u32::try_from(self.buffers.len())
            .map_err(|_| OrreryError::Graphics("buffer handles exhausted".to_string()))?;
        self.buffers.push(StoredBuffer {
            kind,
            data,
            updates: 0,
        });
        Ok(BufferHandle(id))
    }
}

impl RenderBackend for MemoryBackend {
    fn create_vertex_buffer(
        &mut self,
        slot: AttributeSlot,
        data: &[u8],
    ) -> OrreryResult<BufferHandle> {
        self.check("create_vertex_buffer")?;
        if data.len() % slot.stride() != 0 {
            return Err(OrreryError::Graphics(format!(
                "{} bytes is not a whole number of {:?} attributes",
                data.len(),
                slot
            )));
        }
        self.push_buffer(BufferKind::Vertex(slot), data.to_vec())
    }

    fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> OrreryResult<()> {
        self.check("update_vertex_buffer")?;
        let buffer = self
            .buffers
            .get_mut(handle.0 as usize)
            .ok_or_else(|| OrreryError::Graphics(format!("unknown buffer {:?}", handle)))?;

        if buffer.kind == BufferKind::Index {
            return Err(OrreryError::Graphics(format!(
                "{:?} is an index buffer",
                handle
            )));
        }
        if buffer.data.len() != data.len() {
            return Err(OrreryError::Graphics(format!(
                "update of {:?} with {} bytes, buffer holds {}",
                handle,
                data.len(),
                buffer.data.len()
            )));
        }

        buffer.data.copy_from_slice(data);
        buffer.updates += 1;
        Ok(())
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> OrreryResult<BufferHandle> {
        self.check("create_index_buffer")?;
        self.push_buffer(BufferKind::Index, bytemuck::cast_slice(indices).to_vec())
    }

    fn create_vertex_array(
        &mut self,
        layout: &VertexArrayLayout,
    ) -> OrreryResult<VertexArrayHandle> {
        self.check("create_vertex_array")?;

        for (slot, handle) in &layout.attributes {
            match self.buffers.get(handle.0 as usize).map(|b| &b.kind) {
                Some(BufferKind::Vertex(kind)) if kind == slot => {}
                _ => {
                    return Err(OrreryError::Graphics(format!(
                        "{:?} is not a {:?} vertex buffer",
                        handle, slot
                    )));
                }
            }
        }

        let index_bytes = match self.buffers.get(layout.index_buffer.0 as usize) {
            Some(buffer) if buffer.kind == BufferKind::Index => buffer.data.len(),
            _ => {
                return Err(OrreryError::Graphics(format!(
                    "{:?} is not an index buffer",
                    layout.index_buffer
                )));
            }
        };
        if layout.index_count as usize * std::mem::size_of::<u32>() > index_bytes {
            return Err(OrreryError::Graphics(
                "index count exceeds the index buffer".to_string(),
            ));
        }

        let id = u32::try_from(self.vertex_arrays.len())
            .map_err(|_| OrreryError::Graphics("vertex array handles exhausted".to_string()))?;
        self.vertex_arrays.push(layout.clone());
        Ok(VertexArrayHandle(id))
    }
}

impl DrawTarget for MemoryBackend {
    fn bind_vertex_array(&mut self, handle: VertexArrayHandle) -> OrreryResult<()> {
        self.check("bind_vertex_array")?;
        if self.layout(handle).is_none() {
            return Err(OrreryError::Graphics(format!(
                "unknown vertex array {:?}",
                handle
            )));
        }
        self.bound = Some(handle);
        Ok(())
    }

    fn draw_indexed_triangles(&mut self, index_count: u32) -> OrreryResult<()> {
        self.check("draw_indexed_triangles")?;
        let vertex_array = self
            .bound
            .ok_or_else(|| OrreryError::Graphics("draw without a bound vertex array".to_string()))?;

        let available = self.layout(vertex_array).map_or(0, |l| l.index_count);
        if index_count > available || index_count % 3 != 0 {
            return Err(OrreryError::Graphics(format!(
                "cannot draw {} indices from {:?} holding {}",
                index_count, vertex_array, available
            )));
        }

        self.draws.push(DrawCall {
            vertex_array,
            index_count,
        });
        Ok(())
    }
}
