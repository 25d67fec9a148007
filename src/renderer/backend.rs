/// Graphics backend interface
/// The core only ever talks to the GPU through these two traits: one for buffer management,
/// one for issuing draws inside a frame.
use crate::OrreryResult;

/// Opaque handle to a vertex or index buffer owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Opaque handle to a bound set of vertex buffers plus an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Shader input location of each per-vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSlot {
    Position = 0,
    Normal = 1,
    Light = 2,
    Ambience = 3,
    TexCoord = 4,
}

impl AttributeSlot {
    pub const ALL: [AttributeSlot; 5] = [
        AttributeSlot::Position,
        AttributeSlot::Normal,
        AttributeSlot::Light,
        AttributeSlot::Ambience,
        AttributeSlot::TexCoord,
    ];

    pub fn location(self) -> u32 {
        self as u32
    }

    /// Number of f32 components per vertex
    pub fn components(self) -> usize {
        match self {
            AttributeSlot::TexCoord => 2,
            _ => 3,
        }
    }

    /// Bytes per vertex
    pub fn stride(self) -> usize {
        self.components() * std::mem::size_of::<f32>()
    }
}

/// Description of a vertex array: one buffer per attribute slot and the triangle index buffer
#[derive(Debug, Clone, PartialEq)]
pub struct VertexArrayLayout {
    pub attributes: Vec<(AttributeSlot, BufferHandle)>,
    pub index_buffer: BufferHandle,
    pub index_count: u32,
}

impl VertexArrayLayout {
    pub fn buffer_for(&self, slot: AttributeSlot) -> Option<BufferHandle> {
        self.attributes
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, handle)| *handle)
    }
}

/// Buffer creation and replacement
pub trait RenderBackend {
    /// Create a vertex buffer for `slot` initialised with `data` (tightly packed f32 components)
    fn create_vertex_buffer(&mut self, slot: AttributeSlot, data: &[u8])
    -> OrreryResult<BufferHandle>;

    /// Replace the full contents of an existing vertex buffer
    fn update_vertex_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> OrreryResult<()>;

    fn create_index_buffer(&mut self, indices: &[u32]) -> OrreryResult<BufferHandle>;

    fn create_vertex_array(&mut self, layout: &VertexArrayLayout)
    -> OrreryResult<VertexArrayHandle>;
}

/// Draw submission within one frame
pub trait DrawTarget {
    fn bind_vertex_array(&mut self, handle: VertexArrayHandle) -> OrreryResult<()>;

    /// Draw `index_count` indices of the bound vertex array as a triangle list
    fn draw_indexed_triangles(&mut self, index_count: u32) -> OrreryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_locations_match_shader_layout() {
        let locations: Vec<u32> = AttributeSlot::ALL.iter().map(|s| s.location()).collect();
        assert_eq!(locations, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_slot_strides() {
        assert_eq!(AttributeSlot::Position.stride(), 12);
        assert_eq!(AttributeSlot::TexCoord.stride(), 8);
    }

    #[test]
    fn test_layout_lookup() {
        let layout = VertexArrayLayout {
            attributes: vec![
                (AttributeSlot::Position, BufferHandle(3)),
                (AttributeSlot::Light, BufferHandle(5)),
            ],
            index_buffer: BufferHandle(9),
            index_count: 6,
        };

        assert_eq!(layout.buffer_for(AttributeSlot::Light), Some(BufferHandle(5)));
        assert_eq!(layout.buffer_for(AttributeSlot::Normal), None);
    }
}
