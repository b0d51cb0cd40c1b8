//! GPU context.
//!
//! The [`GpuContext`] owns the wgpu instance, adapter, device, and queue.
//! It is created headless: surface creation and presentation belong to the
//! embedding application, which shares the same device.
//!
//! Dynamic indexing into the texture table requires device features that not
//! every adapter offers. Context creation checks for them up front and fails
//! fast with [`RenderError::FeatureNotSupported`] instead of degrading.

use std::sync::Arc;

use crate::error::RenderError;

/// Device features the batch pipeline cannot run without.
const REQUIRED_FEATURES: wgpu::Features = wgpu::Features::TEXTURE_BINDING_ARRAY
    .union(wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING);

/// The GPU device, queue, and the instance/adapter they came from.
///
/// # Thread Safety
///
/// `GpuContext` is `Send + Sync`; the device and queue are internally
/// synchronized by wgpu and can be shared freely behind the `Arc`s returned
/// by [`device`](Self::device) and [`queue`](Self::queue).
pub struct GpuContext {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl GpuContext {
    /// Create a context on the first suitable adapter.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InitializationFailed`] when no adapter is
    /// available and [`RenderError::FeatureNotSupported`] when the adapter
    /// lacks texture binding arrays or non-uniform indexing.
    pub fn new() -> Result<Arc<Self>, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            RenderError::InitializationFailed(format!("no compatible GPU adapter: {e}"))
        })?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let available = adapter.features();
        if !available.contains(REQUIRED_FEATURES) {
            let missing = REQUIRED_FEATURES.difference(available);
            return Err(RenderError::FeatureNotSupported(format!(
                "adapter '{}' lacks {missing:?}",
                adapter.get_info().name
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Batchless Device"),
            required_features: REQUIRED_FEATURES,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| RenderError::InitializationFailed(format!("device creation failed: {e}")))?;

        log::info!("GPU context created on '{}'", adapter.get_info().name);

        Ok(Arc::new(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
        }))
    }

    /// Get the wgpu adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Maximum number of texture table slots the device supports.
    pub fn max_texture_slots(&self) -> u32 {
        self.device.limits().max_sampled_textures_per_shader_stage
    }

    /// Read back the contents of an RGBA8 texture.
    ///
    /// Copies the texture into a staging buffer, waits for the copy, and
    /// returns tightly packed rows. Intended for tests and captures, not the
    /// frame loop.
    pub fn read_texture(
        &self,
        texture: &wgpu::Texture,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        // Copies require 256-byte row alignment; pad and strip below.
        let unpadded_bytes_per_row = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Staging Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let idx = self.queue.submit(std::iter::once(encoder.finish()));

        let _ = self.device.poll(wgpu::PollType::Wait {
            submission_index: Some(idx),
            timeout: Some(std::time::Duration::from_secs(10)),
        });

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|_| RenderError::Internal("readback mapping callback dropped".into()))?
            .map_err(|e| RenderError::Internal(format!("readback mapping failed: {e}")))?;

        let padded = slice.get_mapped_range().to_vec();
        staging.unmap();

        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in padded.chunks_exact(padded_bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        Ok(pixels)
    }
}

// Ensure the context can be shared across threads.
static_assertions::assert_impl_all!(GpuContext: Send, Sync);
