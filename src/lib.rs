//! # Batchless
//!
//! A single-draw batched renderer: many independently transformed,
//! independently textured objects rendered with one dispatch. Each vertex
//! carries an object index that selects its model matrix from a storage
//! buffer (the transform table) and its texture from a bindless texture
//! array (the texture table).
//!
//! The crate provides:
//! - [`GpuContext`] - headless device bring-up with fail-fast capability checks
//! - [`TransformTable`] / [`TextureTable`] - the host-owned per-object tables
//! - [`BatchRenderer`] - the validating wrapper around pipeline and draws
//! - [`stage`] - CPU reference semantics of both shading stages
//!
//! The GPU cannot bounds-check dynamic table indexing, so every submission
//! path validates object indices host-side and rejects violations as
//! [`RenderError`]s before anything reaches the device.
//!
//! ## Example
//!
//! ```ignore
//! use batchless::{BatchMesh, BatchRenderer, GpuContext, MeshData, ObjectTransform,
//!                 RenderTarget, TextureData, TextureTable, TransformTable};
//!
//! let context = GpuContext::new()?;
//! let mut transforms = TransformTable::new(&context, vec![ObjectTransform::IDENTITY; 2])?;
//! let textures = TextureTable::new(&context, &[
//!     TextureData::solid(1, 1, [255, 0, 0, 255]),
//!     TextureData::solid(1, 1, [0, 0, 255, 255]),
//! ])?;
//!
//! let mut renderer = BatchRenderer::new(context.clone(), textures.len(),
//!     wgpu::TextureFormat::Rgba8UnormSrgb)?;
//! let target = RenderTarget::new(&context, 640, 480, wgpu::TextureFormat::Rgba8UnormSrgb);
//!
//! let mut data = MeshData::default();
//! data.push_quad([-1.0, -1.0], [0.0, 1.0], 0);
//! data.push_quad([0.0, -1.0], [1.0, 1.0], 1);
//! let mesh = BatchMesh::upload(&context, &data)?;
//!
//! renderer.submit_draw(&target, &mesh, &mut transforms, &textures)?;
//! ```

pub mod camera;
pub mod context;
pub mod error;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod stage;
pub mod tables;
pub mod types;
pub mod validate;

pub use camera::Camera;
pub use context::GpuContext;
pub use error::{RenderError, TableKind};
pub use mesh::{BatchMesh, MeshData};
pub use pipeline::BatchPipeline;
pub use renderer::{BatchRenderer, RenderTarget};
pub use stage::{fragment_stage, vertex_stage, StageOutput};
pub use tables::{TextureTable, TransformTable};
pub use types::{ObjectTransform, TextureData, Vertex};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
