//! Per-object transform record.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// One entry of the transform table: the object's model matrix.
///
/// Identified by its position in the table. Written by the host between
/// frames; the GPU only ever reads it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectTransform {
    /// Object-space to world-space matrix.
    pub model: Mat4,
}

impl ObjectTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        model: Mat4::IDENTITY,
    };

    /// Wrap an existing model matrix.
    #[inline]
    pub fn from_matrix(model: Mat4) -> Self {
        Self { model }
    }

    /// Compose translation, rotation, and scale into a model matrix.
    #[inline]
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            model: Mat4::from_scale_rotation_translation(scale, rotation, translation),
        }
    }

    /// A pure translation.
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            model: Mat4::from_translation(translation),
        }
    }
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
