//! # Staunton — 3D Chess Board Viewer
//!
//! A chess board rendered with wgpu: pieces are picked with an offscreen ID
//! pass, highlighted with a two-pass stencil outline, and moved along an
//! animated arc. An optional random opponent replies to every move.
//!
//! ```text
//!  window ──InputEvent──► Viewer ──► Controller ──► Session (board, animation, opponent)
//!                           │
//!                           ├──► PickingBuffer ──► RenderBackend (ID pass + readback)
//!                           └──► SceneAssets ──► RenderContext ──► RenderBackend::present
//! ```
//!
//! Everything above [`render::RenderBackend`] is GPU-free and runs against
//! recorded draw commands, so game logic, picking bookkeeping, and the draw
//! passes are unit-tested without a device.

pub mod animation;
pub mod asset;
pub mod board;
pub mod camera;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod math;
pub mod opponent;
pub mod outline;
pub mod picking;
pub mod render;
pub mod scene;
pub mod session;
pub mod time;
pub mod viewer;
pub mod window;

#[cfg(test)]
mod test_support;
