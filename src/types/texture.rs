//! CPU-side texture data.

/// RGBA8 pixel data ready for upload into one texture table slot.
///
/// This is the staging representation: the host decodes images elsewhere and
/// hands the raw pixels to [`crate::tables::TextureTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureData {
    /// Create texture data from raw RGBA8 pixels.
    ///
    /// Returns `None` if `pixels` does not hold exactly
    /// `width * height * 4` bytes or either dimension is zero.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if pixels.len() != (width * height * 4) as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// A solid-color texture of the given size.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = (width.max(1) * height.max(1)) as usize;
        Self {
            width: width.max(1),
            height: height.max(1),
            pixels: color.repeat(count),
        }
    }

    /// Texture width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes per row (tightly packed).
    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    /// Sample the texel nearest to a UV coordinate, clamping to the edge.
    ///
    /// Matches the shared sampler configuration of the texture table
    /// (nearest filtering, clamp-to-edge addressing), so CPU-stage results
    /// line up with what the GPU produces at texel centers.
    pub fn sample_nearest(&self, uv: [f32; 2]) -> [u8; 4] {
        let x = ((uv[0] * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as usize;
        let y = ((uv[1] * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as usize;
        let offset = (y * self.width as usize + x) * 4;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }
}
