//! Per-vertex input record.

use bytemuck::{Pod, Zeroable};

/// A single vertex as consumed by the batch pipeline.
///
/// The layout is fixed: position, normal, texcoord, object index, at shader
/// locations 0 through 3. `object_index` selects both the model matrix in the
/// transform table and the texture slot in the texture table; a vertex is
/// therefore bound to exactly one entry of each. Decoupling the two lookups
/// would require a second index field carried through the stage interface.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal (passed through, unused by the unlit pipeline).
    pub normal: [f32; 3],
    /// Texture coordinate sampled by the fragment stage.
    pub uv: [f32; 2],
    /// Index into the transform and texture tables.
    pub object_index: u32,
}

impl Vertex {
    /// Vertex attributes matching the WGSL input struct.
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
        // Position
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        // Normal
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 12,
            shader_location: 1,
        },
        // UV
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 24,
            shader_location: 2,
        },
        // Object index
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Uint32,
            offset: 32,
            shader_location: 3,
        },
    ];

    /// Create a vertex bound to one table slot.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], object_index: u32) -> Self {
        Self {
            position,
            normal,
            uv,
            object_index,
        }
    }

    /// The vertex buffer layout for the batch pipeline.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        assert_eq!(Vertex::layout().array_stride, 36);
    }

    #[test]
    fn test_vertex_attribute_offsets() {
        let attrs = Vertex::ATTRIBUTES;
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[2].offset, 24);
        assert_eq!(attrs[3].offset, 32);
        // Slot order is part of the external contract.
        for (i, attr) in attrs.iter().enumerate() {
            assert_eq!(attr.shader_location, i as u32);
        }
    }

    #[test]
    fn test_vertex_pod_roundtrip() {
        let vertex = Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.5, 0.5], 7);
        let bytes = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 36);
        let back: Vertex = *bytemuck::from_bytes(bytes);
        assert_eq!(back, vertex);
    }
}
