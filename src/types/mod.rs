//! GPU-visible data types.
//!
//! Everything here is either `bytemuck::Pod` (uploaded verbatim into GPU
//! buffers) or a CPU-side staging representation of a GPU resource.

mod texture;
mod transform;
mod vertex;

pub use texture::TextureData;
pub use transform::ObjectTransform;
pub use vertex::Vertex;
