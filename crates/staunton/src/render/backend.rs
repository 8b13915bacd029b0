//! The seam between the GPU-free viewer core and a real graphics API.
//!
//! Everything above this trait (picking bookkeeping, scene passes, input,
//! animation) runs against recorded [`DrawCommand`]s and is unit-tested
//! with a fake backend. [`WgpuBackend`](super::WgpuBackend) is the one real
//! implementation.

use glam::UVec2;

use super::context::DrawCommand;
use super::vertex::FrameUniforms;
use crate::asset::{ResourceCache, ResourceDevice};

/// Where row 0 of a render target lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelOrigin {
    /// Row 0 is the top row, same as window coordinates (wgpu, Vulkan, Metal).
    TopLeft,
    /// Row 0 is the bottom row (OpenGL-style framebuffers).
    BottomLeft,
}

pub trait RenderBackend: ResourceDevice + Sized {
    /// Destroy and recreate the offscreen picking color + depth targets.
    fn recreate_picking_target(&mut self, size: UVec2);

    /// Clear the picking target and draw `commands` into it. Must not return
    /// until the GPU has finished, so a following read sees the result.
    fn draw_picking(
        &mut self,
        cache: &ResourceCache<Self>,
        frame: &FrameUniforms,
        commands: &[DrawCommand],
    );

    /// Read one RGBA pixel from the picking target, in target coordinates.
    /// `None` when the coordinate is outside the target.
    fn read_picking_pixel(&mut self, x: u32, y: u32) -> Option<[u8; 4]>;

    fn pixel_origin(&self) -> PixelOrigin;

    /// Reconfigure the presentation surface and its depth-stencil buffer.
    fn resize(&mut self, size: UVec2);

    /// Clear, draw `commands` in order to the surface, and present.
    fn present(
        &mut self,
        cache: &ResourceCache<Self>,
        frame: &FrameUniforms,
        commands: &[DrawCommand],
        clear_color: [f64; 4],
    ) -> Result<(), wgpu::SurfaceError>;
}
