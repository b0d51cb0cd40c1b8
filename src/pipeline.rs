//! Batch render pipeline.
//!
//! One bind group, four bindings:
//!
//! | binding | resource                         | stages            |
//! |---------|----------------------------------|-------------------|
//! | 0       | transform table (storage, read)  | vertex            |
//! | 1       | texture table (binding array)    | vertex + fragment |
//! | 2       | shared sampler                   | vertex + fragment |
//! | 3       | projection matrix (uniform)      | vertex            |
//!
//! The texture array length is baked into the bind group layout, so the
//! pipeline is constructed for a fixed slot count; binding a table of a
//! different size is rejected at bind time.

use std::num::NonZeroU32;

use crate::context::GpuContext;
use crate::error::RenderError;
use crate::types::Vertex;

/// Depth format used by the batch pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The compiled batch pipeline and its bind group layout.
pub struct BatchPipeline {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    texture_slots: u32,
    color_format: wgpu::TextureFormat,
}

impl BatchPipeline {
    /// Build the pipeline for a fixed number of texture slots and a color
    /// target format.
    ///
    /// # Errors
    ///
    /// - [`RenderError::ResourceCreationFailed`] when `texture_slots` is
    ///   zero; a binding array cannot be empty.
    /// - [`RenderError::FeatureNotSupported`] when `texture_slots` exceeds
    ///   the device's sampled-texture limit.
    pub fn new(
        context: &GpuContext,
        texture_slots: u32,
        color_format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let slot_count = NonZeroU32::new(texture_slots).ok_or_else(|| {
            RenderError::ResourceCreationFailed(
                "pipeline requires at least one texture slot".into(),
            )
        })?;
        let max_slots = context.max_texture_slots();
        if texture_slots > max_slots {
            return Err(RenderError::FeatureNotSupported(format!(
                "{texture_slots} texture slots exceed the device limit of {max_slots}"
            )));
        }

        let device = context.device();

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Batch Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/batch.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Batch Bind Group Layout"),
            entries: &[
                // Transform table
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Texture table
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: Some(slot_count),
                },
                // Shared sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Projection matrix
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Batch Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Batch Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("batch pipeline created for {texture_slots} texture slots");

        Ok(Self {
            bind_group_layout,
            pipeline,
            texture_slots,
            color_format,
        })
    }

    /// The bind group layout for the four-binding table group.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// The compiled render pipeline.
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    /// Number of texture slots the pipeline was built for.
    pub fn texture_slots(&self) -> u32 {
        self.texture_slots
    }

    /// Color target format the pipeline renders to.
    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }
}

impl std::fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("texture_slots", &self.texture_slots)
            .field("color_format", &self.color_format)
            .finish()
    }
}
