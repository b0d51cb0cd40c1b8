//! Mesh data and GPU upload.
//!
//! [`MeshData`] is the CPU-side vertex/index stream; [`BatchMesh`] is its
//! uploaded form. A single mesh may interleave vertices of many objects —
//! that is the point of the batch pipeline — so the mesh caches the maximum
//! object index it references, letting the renderer validate a draw against
//! the tables without rescanning the stream.

use crate::context::GpuContext;
use crate::error::RenderError;
use crate::types::Vertex;

/// CPU-side triangle-list mesh data.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// The vertex stream.
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from vertex and index streams.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Append a quad in the XY plane spanning `[min, max]` in object space,
    /// with UVs covering the full texture, bound to one object index.
    pub fn push_quad(&mut self, min: [f32; 2], max: [f32; 2], object_index: u32) {
        let normal = [0.0, 0.0, 1.0];
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            Vertex::new([min[0], min[1], 0.0], normal, [0.0, 1.0], object_index),
            Vertex::new([max[0], min[1], 0.0], normal, [1.0, 1.0], object_index),
            Vertex::new([max[0], max[1], 0.0], normal, [1.0, 0.0], object_index),
            Vertex::new([min[0], max[1], 0.0], normal, [0.0, 0.0], object_index),
        ]);
        self.indices.extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base,
            base + 2,
            base + 3,
        ]);
    }

    /// The largest object index in the vertex stream, or `None` when empty.
    pub fn max_object_index(&self) -> Option<u32> {
        self.vertices.iter().map(|v| v.object_index).max()
    }

    /// Check that the streams form a well-formed triangle list.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidMesh`] for empty streams, an index count
    /// that is not a multiple of three, or an index past the vertex stream.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.vertices.is_empty() {
            return Err(RenderError::InvalidMesh("no vertices".into()));
        }
        if self.indices.is_empty() {
            return Err(RenderError::InvalidMesh("no indices".into()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = self.vertices.len() as u32;
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(RenderError::InvalidMesh(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(())
    }
}

/// A mesh uploaded to the GPU, ready for drawing.
pub struct BatchMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    max_object_index: u32,
}

impl BatchMesh {
    /// Validate and upload mesh data.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidMesh`] when [`MeshData::validate`]
    /// fails.
    pub fn upload(context: &GpuContext, data: &MeshData) -> Result<Self, RenderError> {
        data.validate()?;
        // validate() guarantees at least one vertex.
        let max_object_index = data
            .max_object_index()
            .ok_or_else(|| RenderError::InvalidMesh("no vertices".into()))?;

        let device = context.device();
        let queue = context.queue();

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Batch Mesh Vertices"),
            size: std::mem::size_of_val(data.vertices.as_slice()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&data.vertices));

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Batch Mesh Indices"),
            size: std::mem::size_of_val(data.indices.as_slice()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&data.indices));

        log::debug!(
            "mesh uploaded: {} vertices, {} indices, max object index {}",
            data.vertices.len(),
            data.indices.len(),
            max_object_index
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            max_object_index,
        })
    }

    /// The vertex buffer.
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    /// The index buffer (`u32` indices).
    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    /// Number of indices to draw.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The largest object index referenced by the vertex stream.
    pub fn max_object_index(&self) -> u32 {
        self.max_object_index
    }
}

impl std::fmt::Debug for BatchMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchMesh")
            .field("index_count", &self.index_count)
            .field("max_object_index", &self.max_object_index)
            .finish()
    }
}

static_assertions::assert_impl_all!(BatchMesh: Send, Sync);
