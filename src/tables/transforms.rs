//! Per-object transform table.

use glam::Mat4;

use crate::context::GpuContext;
use crate::error::{RenderError, TableKind};
use crate::types::ObjectTransform;
use crate::validate;

/// A dense table of per-object model matrices, mirrored into a read-only
/// storage buffer.
///
/// The host owns the table and may rewrite any record between draws via
/// [`update`](Self::update) followed by [`upload`](Self::upload). Growing or
/// shrinking the table is an explicit reallocation
/// ([`set_transforms`](Self::set_transforms)) that bumps the generation
/// counter; the renderer uses the generation to notice that a bind group
/// references a stale buffer and must be rebuilt. Nothing resizes implicitly,
/// and the GPU never writes to the table.
pub struct TransformTable {
    id: u64,
    records: Vec<ObjectTransform>,
    buffer: wgpu::Buffer,
    generation: u64,
    dirty: bool,
}

impl TransformTable {
    /// Create a table from an initial set of transforms.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyTable`] for an empty set; a zero-length
    /// storage binding cannot satisfy any object index.
    pub fn new(
        context: &GpuContext,
        transforms: Vec<ObjectTransform>,
    ) -> Result<Self, RenderError> {
        if transforms.is_empty() {
            return Err(RenderError::EmptyTable(TableKind::Transforms));
        }

        let buffer = Self::create_buffer(context, &transforms);
        log::debug!("transform table created with {} records", transforms.len());

        Ok(Self {
            id: super::next_table_id(),
            records: transforms,
            buffer,
            generation: 0,
            dirty: false,
        })
    }

    fn create_buffer(context: &GpuContext, records: &[ObjectTransform]) -> wgpu::Buffer {
        let buffer = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Table"),
            size: std::mem::size_of_val(records) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        context
            .queue()
            .write_buffer(&buffer, 0, bytemuck::cast_slice(records));
        buffer
    }

    /// Number of records in the table.
    pub fn len(&self) -> u32 {
        self.records.len() as u32
    }

    /// Whether the table holds no records. Always `false` for a constructed
    /// table; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The host-side records.
    pub fn records(&self) -> &[ObjectTransform] {
        &self.records
    }

    /// The backing storage buffer.
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Process-unique identity of this table. Stable across reallocation;
    /// distinct tables never share an id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Generation of the current allocation. Bumped by reallocation only;
    /// in-place updates keep the generation stable.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rewrite one record in place.
    ///
    /// The change is staged host-side; call [`upload`](Self::upload) (or let
    /// the renderer do it at submission) to make it visible to the next draw.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::IndexOutOfBounds`] when `index` is outside the
    /// table.
    pub fn update(&mut self, index: u32, model: Mat4) -> Result<(), RenderError> {
        validate::check_index(index, self.len(), TableKind::Transforms)?;
        self.records[index as usize] = ObjectTransform::from_matrix(model);
        self.dirty = true;
        Ok(())
    }

    /// Flush staged host-side changes to the GPU buffer.
    ///
    /// Must not be called while a draw referencing the table is in flight;
    /// the renderer blocks on submission completion, so calling this between
    /// renderer calls is always safe.
    pub fn upload(&mut self, queue: &wgpu::Queue) {
        if self.dirty {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.records));
            self.dirty = false;
        }
    }

    /// Replace the whole table, reallocating the GPU buffer.
    ///
    /// Bumps the generation counter: any bind group built against the old
    /// allocation is stale after this call.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EmptyTable`] for an empty replacement set.
    pub fn set_transforms(
        &mut self,
        context: &GpuContext,
        transforms: Vec<ObjectTransform>,
    ) -> Result<(), RenderError> {
        if transforms.is_empty() {
            return Err(RenderError::EmptyTable(TableKind::Transforms));
        }

        self.buffer = Self::create_buffer(context, &transforms);
        self.records = transforms;
        self.generation += 1;
        self.dirty = false;
        log::debug!(
            "transform table reallocated: {} records, generation {}",
            self.records.len(),
            self.generation
        );
        Ok(())
    }
}

impl std::fmt::Debug for TransformTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformTable")
            .field("id", &self.id)
            .field("len", &self.records.len())
            .field("generation", &self.generation)
            .field("dirty", &self.dirty)
            .finish()
    }
}

// Shared between the frame loop and asset threads.
static_assertions::assert_impl_all!(TransformTable: Send, Sync);
