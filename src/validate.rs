//! Host-side contract checks.
//!
//! The device performs no bounds checking on dynamic table indexing; an
//! out-of-range index produces undefined rendering or a validation fault, not
//! a catchable error. All safety therefore lives here, on the submission
//! path: every draw is checked against both tables before any command is
//! encoded. Violations are reported as descriptive errors and never clamped
//! or truncated.

use crate::error::{RenderError, TableKind};

/// Check one object index against a table length.
///
/// A zero-length table rejects every index as [`RenderError::EmptyTable`],
/// including index 0.
pub fn check_index(index: u32, len: u32, table: TableKind) -> Result<(), RenderError> {
    if len == 0 {
        return Err(RenderError::EmptyTable(table));
    }
    if index >= len {
        return Err(RenderError::IndexOutOfBounds { index, len, table });
    }
    Ok(())
}

/// Check a precomputed maximum object index against both tables.
///
/// Meshes cache their maximum index at upload time so per-draw validation
/// does not rescan the vertex stream.
pub fn check_max_index(
    max_index: u32,
    transform_count: u32,
    texture_count: u32,
) -> Result<(), RenderError> {
    check_index(max_index, transform_count, TableKind::Transforms)?;
    check_index(max_index, texture_count, TableKind::Textures)?;
    Ok(())
}
