//! Bindless texture table.

use crate::context::GpuContext;
use crate::error::{RenderError, TableKind};
use crate::types::TextureData;

/// An array of 2-D textures plus one shared sampler, bound as a single
/// bindless binding and indexed dynamically by the fragment stage.
///
/// All slots share the sampler (nearest filtering, clamp-to-edge); per-slot
/// sampling parameters are an explicit simplification this table does not
/// offer. The table is immutable once created: replacing textures means
/// creating a new table and rebinding it.
pub struct TextureTable {
    id: u64,
    textures: Vec<wgpu::Texture>,
    views: Vec<wgpu::TextureView>,
    sampler: wgpu::Sampler,
}

impl TextureTable {
    /// Upload a set of RGBA8 images into a new table, slot `i` holding
    /// `images[i]`.
    ///
    /// # Errors
    ///
    /// - [`RenderError::EmptyTable`] for an empty set; a zero-length binding
    ///   array cannot be created.
    /// - [`RenderError::FeatureNotSupported`] when the set exceeds the
    ///   device's sampled-texture limit.
    pub fn new(context: &GpuContext, images: &[TextureData]) -> Result<Self, RenderError> {
        if images.is_empty() {
            return Err(RenderError::EmptyTable(TableKind::Textures));
        }
        let max_slots = context.max_texture_slots();
        if images.len() as u32 > max_slots {
            return Err(RenderError::FeatureNotSupported(format!(
                "texture table of {} entries exceeds the device limit of {max_slots}",
                images.len()
            )));
        }

        let device = context.device();
        let queue = context.queue();

        let mut textures = Vec::with_capacity(images.len());
        let mut views = Vec::with_capacity(images.len());
        for (slot, image) in images.iter().enumerate() {
            let size = wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            };
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("Texture Table Slot {slot}")),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(image.bytes_per_row()),
                    rows_per_image: Some(image.height()),
                },
                size,
            );
            views.push(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            textures.push(texture);
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Table Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::debug!("texture table created with {} slots", views.len());

        Ok(Self {
            id: super::next_table_id(),
            textures,
            views,
            sampler,
        })
    }

    /// Process-unique identity of this table; distinct tables never share
    /// an id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of texture slots.
    pub fn len(&self) -> u32 {
        self.views.len() as u32
    }

    /// Whether the table holds no slots. Always `false` for a constructed
    /// table; present for API completeness.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// The texture views, in slot order, for binding as a view array.
    pub fn views(&self) -> Vec<&wgpu::TextureView> {
        self.views.iter().collect()
    }

    /// The shared sampler.
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// The texture in a given slot, if it exists.
    pub fn texture(&self, slot: u32) -> Option<&wgpu::Texture> {
        self.textures.get(slot as usize)
    }
}

impl std::fmt::Debug for TextureTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureTable")
            .field("id", &self.id)
            .field("len", &self.views.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(TextureTable: Send, Sync);
