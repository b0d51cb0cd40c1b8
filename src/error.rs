//! Renderer error types.

use std::fmt;

/// Which per-object table a contract violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The transform table (storage buffer of model matrices).
    Transforms,
    /// The texture table (bindless texture array).
    Textures,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transforms => write!(f, "transform table"),
            Self::Textures => write!(f, "texture table"),
        }
    }
}

/// Errors that can occur in the batch renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Failed to initialize the GPU context.
    InitializationFailed(String),
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// A required device feature or limit is not available.
    FeatureNotSupported(String),
    /// An object index references a slot outside a table.
    IndexOutOfBounds {
        /// The offending object index.
        index: u32,
        /// Length of the table the index was checked against.
        len: u32,
        /// Which table the index was checked against.
        table: TableKind,
    },
    /// A table was created or bound with zero entries.
    EmptyTable(TableKind),
    /// A bound texture table does not match the pipeline's slot count.
    TableSizeMismatch {
        /// Number of texture slots the pipeline was built for.
        expected: u32,
        /// Number of entries in the bound table.
        actual: u32,
    },
    /// A render target's color format differs from the pipeline's.
    TargetFormatMismatch {
        /// Color format the pipeline was built for.
        expected: wgpu::TextureFormat,
        /// Color format of the submitted target.
        actual: wgpu::TextureFormat,
    },
    /// Mesh data is malformed (empty, or indices not forming triangles).
    InvalidMesh(String),
    /// The GPU device was lost.
    DeviceLost,
    /// An internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::FeatureNotSupported(msg) => write!(f, "feature not supported: {msg}"),
            Self::IndexOutOfBounds { index, len, table } => {
                write!(f, "object index {index} out of bounds for {table} of length {len}")
            }
            Self::EmptyTable(table) => write!(f, "{table} has zero entries"),
            Self::TableSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "texture table has {actual} entries but the pipeline was built for {expected}"
                )
            }
            Self::TargetFormatMismatch { expected, actual } => {
                write!(
                    f,
                    "render target format {actual:?} does not match pipeline format {expected:?}"
                )
            }
            Self::InvalidMesh(msg) => write!(f, "invalid mesh: {msg}"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}
