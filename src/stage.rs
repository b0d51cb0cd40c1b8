//! CPU reference implementation of the two shading stages.
//!
//! The GPU executes both stages as massively parallel pure functions with no
//! bounds checking on table lookups; `shaders/batch.wgsl` is the authoritative
//! device code. The functions here implement the same semantics on the CPU
//! with explicit `Result`-returning bounds checks, so stage behavior can be
//! unit-tested without a device and so the host-side validation path shares
//! one definition of "in bounds".
//!
//! Both stages are free functions over per-invocation inputs plus shared
//! read-only tables. There is no state and no ordering between invocations.

use glam::{Mat4, Vec2, Vec4};

use crate::error::{RenderError, TableKind};
use crate::types::{ObjectTransform, TextureData, Vertex};

/// Vertex-stage output, carried to the fragment stage.
///
/// On the GPU, `uv` is interpolated across the primitive while
/// `object_index` is flat (taken from the provoking vertex, never
/// interpolated) because it is used for table lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageOutput {
    /// Clip-space position, consumed by rasterization.
    pub clip_position: Vec4,
    /// Texture coordinate, passed through from the vertex.
    pub uv: Vec2,
    /// Table index, passed through un-interpolated.
    pub object_index: u32,
}

/// Run the vertex stage for one invocation.
///
/// Fetches the vertex's model matrix from the transform table and emits the
/// clip-space position `projection * model * (position, 1)` along with the
/// pass-through attributes.
///
/// # Errors
///
/// Returns [`RenderError::IndexOutOfBounds`] when the vertex's object index
/// does not resolve to a transform table entry. The WGSL counterpart performs
/// no such check; callers must validate the vertex stream before submission.
pub fn vertex_stage(
    vertex: &Vertex,
    transforms: &[ObjectTransform],
    projection: Mat4,
) -> Result<StageOutput, RenderError> {
    let transform = transforms.get(vertex.object_index as usize).ok_or(
        RenderError::IndexOutOfBounds {
            index: vertex.object_index,
            len: transforms.len() as u32,
            table: TableKind::Transforms,
        },
    )?;

    let position = Vec4::new(
        vertex.position[0],
        vertex.position[1],
        vertex.position[2],
        1.0,
    );

    Ok(StageOutput {
        clip_position: projection * transform.model * position,
        uv: Vec2::from_array(vertex.uv),
        object_index: vertex.object_index,
    })
}

/// Run the fragment stage for one invocation.
///
/// Samples the texture selected by the carried object index at the carried
/// UV and returns the color unmodified. Nearest sampling with clamp-to-edge
/// addressing, matching the texture table's shared sampler.
///
/// # Errors
///
/// Returns [`RenderError::IndexOutOfBounds`] when the object index does not
/// resolve to a texture table entry.
pub fn fragment_stage(
    output: &StageOutput,
    textures: &[TextureData],
) -> Result<[u8; 4], RenderError> {
    let texture = textures.get(output.object_index as usize).ok_or(
        RenderError::IndexOutOfBounds {
            index: output.object_index,
            len: textures.len() as u32,
            table: TableKind::Textures,
        },
    )?;

    Ok(texture.sample_nearest(output.uv.to_array()))
}
