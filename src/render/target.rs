//! Offscreen render targets
//!
//! Every intermediate framebuffer the pass chain owns is a `RenderTarget`.
//! Targets only reallocate when their size actually changes.

use crate::gpu_context::GpuContext;

/// Scene color precision; lighting is accumulated in linear space
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Display-encoded color between post passes
pub const LDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Selection coverage (r) and visibility (g)
pub const MASK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg8Unorm;

/// A single texture plus its default view
pub struct RenderTarget {
    label: &'static str,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl RenderTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = Self::create_texture(device, label, width, height, format);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            label,
            texture,
            view,
            width: width.max(1),
            height: height.max(1),
            format,
        }
    }

    /// Reallocate at a new size; returns false when the size is unchanged
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return false;
        }

        self.texture = Self::create_texture(device, self.label, width, height, self.format);
        self.view = self.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.width = width;
        self.height = height;
        true
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Copy the target back to the CPU as tightly packed rows
    ///
    /// Blocks until the GPU finishes. Only 4-byte-per-texel color formats
    /// are supported; anything else returns `None`.
    pub fn read_pixels(&self, gpu: &GpuContext) -> Option<Vec<u8>> {
        if self.format.block_copy_size(None) != Some(4) {
            return None;
        }

        let bytes_per_row = self.width * 4;
        let padded_bytes_per_row = bytes_per_row.div_ceil(256) * 256;
        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Render Target Readback"),
            size: (padded_bytes_per_row * self.height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Target Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv().ok().and_then(|r| r.ok())?;

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((bytes_per_row * self.height) as usize);
        for y in 0..self.height {
            let start = (y * padded_bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + bytes_per_row as usize]);
        }
        drop(data);
        staging.unmap();
        Some(pixels)
    }

    fn create_texture(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> wgpu::Texture {
        let usage = if format.is_depth_stencil_format() {
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC
        };
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }
}

/// Two same-sized targets used alternately by consecutive passes
pub struct PingPong {
    targets: [RenderTarget; 2],
}

impl PingPong {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            targets: [
                RenderTarget::new(device, "Post Texture A", width, height, format),
                RenderTarget::new(device, "Post Texture B", width, height, format),
            ],
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        for target in &mut self.targets {
            target.resize(device, width, height);
        }
    }

    /// Target written by pass `index`; even passes write A, odd passes write B
    pub fn write_target(&self, index: usize) -> &RenderTarget {
        &self.targets[index % 2]
    }

    pub fn targets(&self) -> &[RenderTarget; 2] {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(LDR_FORMAT.block_copy_size(None), Some(4));
        assert_eq!(HDR_FORMAT.block_copy_size(None), Some(8));
        assert!(DEPTH_FORMAT.is_depth_stencil_format());
    }
}
