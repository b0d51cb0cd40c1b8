//! Host-owned per-object tables.
//!
//! Draws resolve per-object data through two independently sized tables, both
//! read-only from the GPU's point of view for the duration of a draw:
//!
//! - [`TransformTable`] — a dense storage buffer of model matrices, indexed
//!   by the vertex stage.
//! - [`TextureTable`] — a bindless array of 2-D textures plus one shared
//!   sampler, indexed by the fragment stage.
//!
//! Tables are explicit handles passed by reference into renderer calls, not
//! ambient state. Reallocation bumps a generation counter so a bind group
//! built against an older allocation can be detected and rebuilt.

use std::sync::atomic::{AtomicU64, Ordering};

mod textures;
mod transforms;

pub use textures::TextureTable;
pub use transforms::TransformTable;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a process-unique table id. Ids never repeat, so two tables can
/// be told apart even when their generations coincide.
pub(crate) fn next_table_id() -> u64 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}
