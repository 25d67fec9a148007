/// Render submission: one-time upload of a body's mesh, per-transform replacement of its
/// dynamic attributes, and the indexed draw
use glam::{DVec3, Vec3};

use crate::{
    OrreryError, OrreryResult,
    math::Body,
    renderer::backend::{
        AttributeSlot, BufferHandle, DrawTarget, RenderBackend, VertexArrayHandle,
        VertexArrayLayout,
    },
};

/// Backend resources owned by one attached body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    pub positions: BufferHandle,
    pub normals: BufferHandle,
    pub light: BufferHandle,
    pub ambience: BufferHandle,
    pub tex_coords: BufferHandle,
    pub indices: BufferHandle,
    pub vertex_array: VertexArrayHandle,
    pub index_count: u32,
}

/// Narrow double-precision attributes to what the shader consumes
fn narrow(values: &[DVec3]) -> Vec<Vec3> {
    values.iter().map(|v| v.as_vec3()).collect()
}

impl Body {
    /// Create every backend buffer for this body and upload the full mesh.
    /// Attaching twice keeps the existing buffers.
    pub fn attach(&mut self, backend: &mut dyn RenderBackend) -> OrreryResult<MeshBuffers> {
        if let Some(buffers) = self.buffers {
            log::debug!("Body already attached as {:?}", buffers.vertex_array);
            return Ok(buffers);
        }
        self.validate()?;

        let index_count = u32::try_from(self.indices.len())
            .map_err(|_| OrreryError::InvalidMesh("too many indices".to_string()))?;

        let positions = backend.create_vertex_buffer(
            AttributeSlot::Position,
            bytemuck::cast_slice(&narrow(&self.positions)),
        )?;
        let normals = backend.create_vertex_buffer(
            AttributeSlot::Normal,
            bytemuck::cast_slice(&narrow(&self.normals)),
        )?;
        let light = backend.create_vertex_buffer(
            AttributeSlot::Light,
            bytemuck::cast_slice(&narrow(&self.light)),
        )?;
        let ambience = backend
            .create_vertex_buffer(AttributeSlot::Ambience, bytemuck::cast_slice(&self.ambience))?;
        let tex_coords = backend.create_vertex_buffer(
            AttributeSlot::TexCoord,
            bytemuck::cast_slice(&self.tex_coords),
        )?;
        let indices = backend.create_index_buffer(&self.indices)?;

        let layout = VertexArrayLayout {
            attributes: vec![
                (AttributeSlot::Position, positions),
                (AttributeSlot::Normal, normals),
                (AttributeSlot::Light, light),
                (AttributeSlot::Ambience, ambience),
                (AttributeSlot::TexCoord, tex_coords),
            ],
            index_buffer: indices,
            index_count,
        };
        let vertex_array = backend.create_vertex_array(&layout)?;

        let buffers = MeshBuffers {
            positions,
            normals,
            light,
            ambience,
            tex_coords,
            indices,
            vertex_array,
            index_count,
        };
        self.buffers = Some(buffers);
        self.dirty = false;

        log::debug!(
            "Attached body: {} vertices, {} indices, {:?}",
            self.positions.len(),
            index_count,
            vertex_array
        );

        Ok(buffers)
    }

    pub fn mesh_buffers(&self) -> Option<&MeshBuffers> {
        self.buffers.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.buffers.is_some()
    }

    /// Push positions, normals and light vectors if they changed since the last push.
    /// A body that has not been attached yet has nothing to push to.
    pub fn submit(&mut self, backend: &mut dyn RenderBackend) -> OrreryResult<()> {
        let Some(buffers) = self.buffers else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }

        backend.update_vertex_buffer(
            buffers.positions,
            bytemuck::cast_slice(&narrow(&self.positions)),
        )?;
        backend.update_vertex_buffer(buffers.normals, bytemuck::cast_slice(&narrow(&self.normals)))?;
        backend.update_vertex_buffer(buffers.light, bytemuck::cast_slice(&narrow(&self.light)))?;

        self.dirty = false;
        Ok(())
    }

    /// One indexed-triangle draw of the whole mesh
    pub fn render_mesh(&self, target: &mut dyn DrawTarget) -> OrreryResult<()> {
        let buffers = self
            .buffers
            .ok_or_else(|| OrreryError::Graphics("Body has no backend buffers".to_string()))?;

        target.bind_vertex_array(buffers.vertex_array)?;
        target.draw_indexed_triangles(buffers.index_count)
    }
}
