//! The host-facing batch renderer.
//!
//! [`BatchRenderer`] is the validating wrapper in front of the device: every
//! operation checks the table contracts before any GPU command is recorded.
//! Tables are passed by reference into each call rather than captured, so
//! their ownership stays with the caller; a swapped-in or reallocated table
//! is detected via the tables' identity and generation and triggers a
//! rebind.

use std::sync::Arc;

use glam::Mat4;

use crate::context::GpuContext;
use crate::error::RenderError;
use crate::mesh::BatchMesh;
use crate::pipeline::{BatchPipeline, DEPTH_FORMAT};
use crate::tables::{TextureTable, TransformTable};
use crate::validate;

/// Clear color applied by each draw (dark blue-grey).
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

/// An offscreen color + depth target for the batch pass.
///
/// Presentation is the embedding application's concern; the renderer draws
/// into a texture that the application composites or reads back.
pub struct RenderTarget {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Create a target of the given size and color format.
    pub fn new(
        context: &GpuContext,
        width: u32,
        height: u32,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let device = context.device();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Batch Color Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Batch Depth Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            width,
            height,
        }
    }

    /// The color texture, for readback or compositing.
    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color
    }

    /// Target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Format of the color texture.
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color.format()
    }
}

/// Identity of the tables the cached bind group was built against.
///
/// A cached bind group is only valid for the exact pair of tables it was
/// built from; in-place transform updates keep the identity, reallocation
/// or swapping in a different table invalidates it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct BoundTables {
    transforms_id: u64,
    transforms_generation: u64,
    textures_id: u64,
}

impl BoundTables {
    fn of(transforms: &TransformTable, textures: &TextureTable) -> Self {
        Self {
            transforms_id: transforms.id(),
            transforms_generation: transforms.generation(),
            textures_id: textures.id(),
        }
    }
}

/// Renders a batch of independently transformed, independently textured
/// objects in a single draw dispatch.
///
/// The renderer owns the pipeline and the projection state; the transform
/// and texture tables stay with the caller and are validated on every call
/// that touches them.
pub struct BatchRenderer {
    context: Arc<GpuContext>,
    pipeline: BatchPipeline,
    projection: Mat4,
    projection_buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
    bound: Option<BoundTables>,
}

impl BatchRenderer {
    /// Create a renderer whose pipeline holds `texture_slots` texture table
    /// entries and renders to `color_format` targets.
    ///
    /// # Errors
    ///
    /// Propagates pipeline construction failures (zero slots, device limit
    /// exceeded).
    pub fn new(
        context: Arc<GpuContext>,
        texture_slots: u32,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let pipeline = BatchPipeline::new(&context, texture_slots, color_format)?;

        let projection_buffer = context.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("Projection Matrix"),
            size: std::mem::size_of::<Mat4>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let projection = Mat4::IDENTITY;
        context
            .queue()
            .write_buffer(&projection_buffer, 0, bytemuck::bytes_of(&projection));

        Ok(Self {
            context,
            pipeline,
            projection,
            projection_buffer,
            bind_group: None,
            bound: None,
        })
    }

    /// The current projection matrix.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Set the projection matrix shared by every vertex in a draw.
    ///
    /// Typically called once per frame or camera change. Must not race an
    /// in-flight draw; [`submit_draw`](Self::submit_draw) blocks on
    /// completion, so calling this between draws is always ordered.
    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.context
            .queue()
            .write_buffer(&self.projection_buffer, 0, bytemuck::bytes_of(&projection));
    }

    /// Rewrite one transform record and flush it to the GPU.
    ///
    /// Thin pass-through to [`TransformTable::update`]; the bounds check
    /// happens there.
    pub fn update_transform(
        &self,
        transforms: &mut TransformTable,
        index: u32,
        model: Mat4,
    ) -> Result<(), RenderError> {
        transforms.update(index, model)?;
        transforms.upload(self.context.queue());
        Ok(())
    }

    /// Build the bind group for a pair of tables.
    ///
    /// Called implicitly by [`submit_draw`](Self::submit_draw) when needed;
    /// calling it eagerly just front-loads the work.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TableSizeMismatch`] when the texture table's
    /// length differs from the pipeline's slot count.
    pub fn bind_textures(
        &mut self,
        transforms: &TransformTable,
        textures: &TextureTable,
    ) -> Result<(), RenderError> {
        if textures.len() != self.pipeline.texture_slots() {
            return Err(RenderError::TableSizeMismatch {
                expected: self.pipeline.texture_slots(),
                actual: textures.len(),
            });
        }

        let bind_group = self
            .context
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Batch Bind Group"),
                layout: self.pipeline.bind_group_layout(),
                entries: &[
                    // Transform table
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: transforms.buffer().as_entire_binding(),
                    },
                    // Texture table
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureViewArray(&textures.views()),
                    },
                    // Shared sampler
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(textures.sampler()),
                    },
                    // Projection matrix
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: self.projection_buffer.as_entire_binding(),
                    },
                ],
            });

        self.bind_group = Some(bind_group);
        self.bound = Some(BoundTables::of(transforms, textures));
        Ok(())
    }

    /// Draw a mesh against the tables in a single dispatch.
    ///
    /// Validates the mesh's object indices against both tables and the
    /// texture table against the pipeline's slot count, flushes any staged
    /// transform updates, rebinds whenever the tables differ from the pair
    /// the cached bind group was built against (a different table, or the
    /// same table reallocated), records the pass, submits it, and blocks
    /// until the GPU has finished. Blocking gives the caller the
    /// happens-before edge the tables' read-only contract requires: once
    /// this returns, mutating the tables cannot race the draw.
    ///
    /// # Errors
    ///
    /// - [`RenderError::IndexOutOfBounds`] / [`RenderError::EmptyTable`]
    ///   when the mesh references a slot outside either table.
    /// - [`RenderError::TableSizeMismatch`] when the texture table does not
    ///   match the pipeline's slot count.
    /// - [`RenderError::TargetFormatMismatch`] when the target's color
    ///   format differs from the pipeline's.
    /// - [`RenderError::DeviceLost`] when the device fails while waiting.
    pub fn submit_draw(
        &mut self,
        target: &RenderTarget,
        mesh: &BatchMesh,
        transforms: &mut TransformTable,
        textures: &TextureTable,
    ) -> Result<(), RenderError> {
        validate::check_max_index(mesh.max_object_index(), transforms.len(), textures.len())?;

        // Checked here as well as in bind_textures: a cached bind group must
        // never let a wrong-sized table through.
        if textures.len() != self.pipeline.texture_slots() {
            return Err(RenderError::TableSizeMismatch {
                expected: self.pipeline.texture_slots(),
                actual: textures.len(),
            });
        }
        if target.color_format() != self.pipeline.color_format() {
            return Err(RenderError::TargetFormatMismatch {
                expected: self.pipeline.color_format(),
                actual: target.color_format(),
            });
        }

        transforms.upload(self.context.queue());

        let wanted = BoundTables::of(transforms, textures);
        if self.bind_group.is_none() || self.bound != Some(wanted) {
            log::debug!(
                "bound tables changed ({:?} -> {:?}), rebinding",
                self.bound,
                wanted
            );
            self.bind_textures(transforms, textures)?;
        }
        let bind_group = self
            .bind_group
            .as_ref()
            .ok_or_else(|| RenderError::Internal("bind group missing after rebind".into()))?;

        let mut encoder =
            self.context
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Batch Encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Batch Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            pass.set_pipeline(self.pipeline.pipeline());
            pass.set_bind_group(0, Some(bind_group), &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
            pass.set_index_buffer(mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
        }

        let submission_index = self.context.queue().submit(std::iter::once(encoder.finish()));
        self.context
            .device()
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission_index),
                timeout: Some(std::time::Duration::from_secs(10)),
            })
            .map_err(|_| RenderError::DeviceLost)?;

        Ok(())
    }
}

impl std::fmt::Debug for BatchRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRenderer")
            .field("pipeline", &self.pipeline)
            .field("bound", &self.bound)
            .finish()
    }
}
