//! # Assets — Shaders, Textures, Meshes, Materials
//!
//! All GPU-resident resources are created through the [`ResourceCache`] and
//! live until it is torn down. Callers hold small `Copy` handles, never GPU
//! objects:
//!
//! ```text
//! ┌───────────────────────────── ResourceCache<D> ─────────────────────────────┐
//! │ shaders   Vec<ShaderEntry>   keyed by (vertex path, fragment path)        │
//! │ textures  Vec<TextureEntry>  keyed by image path                          │
//! │ materials Vec<Material>      keyed by name, each → one TextureHandle      │
//! │ meshes    Vec<MeshEntry>     keyed by model path, each → 1 or 3 materials │
//! │                                                                            │
//! │ creation order: [Shader, Shader, Texture, Texture, Mesh, Texture, ...]     │
//! └────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache never touches files or the GPU directly. Reading and parsing go
//! through an [`AssetDecoder`]; GPU uploads go through a [`ResourceDevice`].
//! The wgpu backend implements the latter for real rendering, and tests plug
//! in recording fakes for both.
//!
//! ## Comparison
//!
//! - **Bevy**: `AssetServer` with async loading, reference-counted handles,
//!   and hot-reloading. The set of assets here is fixed at startup, so none of
//!   that machinery pays for itself.
//! - **Our approach**: Synchronous, index-based, with path deduplication and
//!   explicit reverse-order teardown.

pub mod cache;
pub mod decode;

pub use cache::{Material, MaterialHandle, MeshEntry, MeshHandle, ResourceCache, ShaderHandle, TextureHandle};
pub use decode::{AssetDecoder, DecodedImage, FsDecoder, MaterialSource, ModelData, ModelTopology};

use crate::render::vertex::MeshVertex;

/// Creates and destroys GPU-side objects on behalf of the [`ResourceCache`].
///
/// Implementations own nothing: every object they create is handed to the
/// cache, which hands it back for destruction.
pub trait ResourceDevice {
    type Shader;
    type Texture;
    type Mesh;

    /// Compile and link a vertex/fragment pair. The error is the compiler's
    /// diagnostic text.
    fn create_shader(
        &mut self,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Shader, String>;

    fn create_texture(&mut self, label: &str, image: &DecodedImage) -> Self::Texture;

    fn create_mesh(&mut self, label: &str, vertices: &[MeshVertex], indices: &[u32]) -> Self::Mesh;

    fn destroy_shader(&mut self, shader: Self::Shader);

    fn destroy_texture(&mut self, texture: Self::Texture);

    fn destroy_mesh(&mut self, mesh: Self::Mesh);
}
