//! GPU context: wgpu device, queue, and surface management.
//!
//! [`GpuContext`] is created once the window exists and is owned by the
//! [`WgpuBackend`](super::WgpuBackend). Creation is fallible: a machine
//! without a usable adapter is a startup error, not a panic.

use std::sync::Arc;

use glam::UVec2;

use crate::error::RenderError;

pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    pub fn new(window: Arc<winit::window::Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("staunton device"),
            ..Default::default()
        }))?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_format(&caps.formats).ok_or(RenderError::NoSurfaceFormat)?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::debug!("Surface configured as {format:?}");

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
        })
    }

    /// Reconfigure the surface. Zero-sized requests (minimized window) are
    /// ignored.
    pub fn resize(&mut self, size: UVec2) {
        if size.x == 0 || size.y == 0 {
            return;
        }
        self.surface_config.width = size.x;
        self.surface_config.height = size.y;
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn surface_size(&self) -> UVec2 {
        UVec2::new(self.surface_config.width, self.surface_config.height)
    }
}

/// Prefer an sRGB format so textures and clear colors come out as authored.
fn choose_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_format_is_preferred() {
        let formats = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(choose_format(&formats), Some(wgpu::TextureFormat::Bgra8UnormSrgb));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [wgpu::TextureFormat::Rgba16Float];
        assert_eq!(choose_format(&formats), Some(wgpu::TextureFormat::Rgba16Float));
        assert_eq!(choose_format(&[]), None);
    }
}
