//! Offscreen ID target for mouse picking.
//!
//! One color attachment in [`PICKING_FORMAT`], a matching depth-stencil
//! attachment, and a tiny staging buffer for single-pixel readback. The
//! staging row is padded to 256 bytes, the copy alignment wgpu requires.

use glam::UVec2;

use super::pipeline::{DEPTH_FORMAT, PICKING_FORMAT, create_depth_texture};

const STAGING_ROW_BYTES: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

pub(crate) struct PickingTarget {
    color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
    staging: wgpu::Buffer,
    size: UVec2,
}

impl PickingTarget {
    pub fn new(device: &wgpu::Device, size: UVec2) -> Self {
        let size = size.max(UVec2::ONE);
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("picking color"),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICKING_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = create_depth_texture(device, "picking depth", size.x, size.y);

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("picking staging"),
            size: STAGING_ROW_BYTES as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::debug!("Picking target {}x{} ({DEPTH_FORMAT:?} depth)", size.x, size.y);

        Self {
            color,
            color_view,
            depth_view,
            staging,
            size,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Copy one pixel to the staging buffer and block until it can be read.
    pub fn read_pixel(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: u32,
        y: u32,
    ) -> Option<[u8; 4]> {
        if x >= self.size.x || y >= self.size.y {
            return None;
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("picking readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(STAGING_ROW_BYTES),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("Picking readback poll failed: {e}");
            // Cancel the pending map so the next readback can map again.
            self.staging.unmap();
            return None;
        }
        rx.recv().ok()?.ok()?;

        let data = slice.get_mapped_range();
        let pixel = [data[0], data[1], data[2], data[3]];
        drop(data);
        self.staging.unmap();
        Some(pixel)
    }

    pub fn destroy(self) {
        self.color.destroy();
        self.staging.destroy();
    }
}
