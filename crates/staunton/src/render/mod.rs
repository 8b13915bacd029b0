//! Rendering subsystem.
//!
//! [`RenderContext`] records what the scene wants drawn as a list of
//! [`DrawCommand`]s; a [`RenderBackend`] turns that list into GPU work.

pub mod backend;
pub mod context;
pub mod gpu;
mod picking_target;
mod pipeline;
pub mod vertex;
pub mod wgpu_backend;

pub use backend::{PixelOrigin, RenderBackend};
pub use context::{DrawCommand, RenderContext, StencilMode};
pub use gpu::GpuContext;
pub use vertex::{FrameUniforms, MeshVertex};
pub use wgpu_backend::WgpuBackend;
