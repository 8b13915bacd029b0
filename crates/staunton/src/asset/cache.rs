//! # Resource Cache — Load Once, Hand Out Handles
//!
//! Each `load_*` call first checks an index keyed by source path. On a hit it
//! returns the stored handle without touching the decoder or the device. On a
//! miss it decodes, uploads, records the entry, and remembers the creation in
//! a global order list so [`ResourceCache::teardown`] can release everything
//! newest-first.
//!
//! ## Handle Stability
//!
//! Handles are indices into per-kind `Vec`s. Entries are only ever appended
//! (until teardown), so a handle stays valid for the life of the cache and two
//! handles compare equal exactly when they name the same resource.
//!
//! ## Failure
//!
//! Any decode or device failure is logged with its path and returned as an
//! [`AssetError`]. Nothing is cached for a failed load, and no partial entry
//! is left behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::decode::{AssetDecoder, MaterialSource};
use super::ResourceDevice;
use crate::error::AssetError;

/// Handle to a compiled vertex/fragment shader pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) usize);

/// Handle to an uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) usize);

/// Handle to a named material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub(crate) usize);

/// Handle to an uploaded mesh and its materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) usize);

/// A named reference to one base color texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    pub texture: TextureHandle,
}

pub struct ShaderEntry<S> {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    pub gpu: S,
}

pub struct TextureEntry<T> {
    pub path: PathBuf,
    pub gpu: T,
    pub width: u32,
    pub height: u32,
}

pub struct MeshEntry<M> {
    pub path: PathBuf,
    pub gpu: M,
    pub index_count: u32,
    pub default_material: MaterialHandle,
    /// `[white, black]` when the model declares color variants.
    pub variants: Option<[MaterialHandle; 2]>,
}

impl<M> MeshEntry<M> {
    /// Material for white pieces, falling back to the default.
    pub fn white_material(&self) -> MaterialHandle {
        self.variants.map_or(self.default_material, |[white, _]| white)
    }

    /// Material for black pieces, falling back to the default.
    pub fn black_material(&self) -> MaterialHandle {
        self.variants.map_or(self.default_material, |[_, black]| black)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Shader,
    Texture,
    Mesh,
}

/// Arena of GPU resources, deduplicated by source path.
pub struct ResourceCache<D: ResourceDevice> {
    shaders: Vec<ShaderEntry<D::Shader>>,
    shader_index: HashMap<(PathBuf, PathBuf), ShaderHandle>,
    textures: Vec<TextureEntry<D::Texture>>,
    texture_index: HashMap<PathBuf, TextureHandle>,
    materials: Vec<Material>,
    material_index: HashMap<String, MaterialHandle>,
    meshes: Vec<MeshEntry<D::Mesh>>,
    mesh_index: HashMap<PathBuf, MeshHandle>,
    created: Vec<ResourceKind>,
}

impl<D: ResourceDevice> ResourceCache<D> {
    pub fn new() -> Self {
        Self {
            shaders: Vec::new(),
            shader_index: HashMap::new(),
            textures: Vec::new(),
            texture_index: HashMap::new(),
            materials: Vec::new(),
            material_index: HashMap::new(),
            meshes: Vec::new(),
            mesh_index: HashMap::new(),
            created: Vec::new(),
        }
    }

    // ── Shaders ──────────────────────────────────────────────────────────

    /// Load (or reuse) the shader built from a vertex and a fragment source.
    pub fn load_shader(
        &mut self,
        device: &mut D,
        decoder: &dyn AssetDecoder,
        vertex: &Path,
        fragment: &Path,
    ) -> Result<ShaderHandle, AssetError> {
        let key = (vertex.to_path_buf(), fragment.to_path_buf());
        if let Some(&handle) = self.shader_index.get(&key) {
            return Ok(handle);
        }

        let vertex_source = logged(decoder.read_text(vertex))?;
        let fragment_source = logged(decoder.read_text(fragment))?;

        let label = format!("{} + {}", vertex.display(), fragment.display());
        let gpu = device
            .create_shader(&label, &vertex_source, &fragment_source)
            .map_err(|log| AssetError::Shader {
                vertex: key.0.clone(),
                fragment: key.1.clone(),
                log,
            });
        let gpu = logged(gpu)?;

        let handle = ShaderHandle(self.shaders.len());
        log::info!(
            "Shader created (vertex: \"{}\") (fragment: \"{}\") (id: {})",
            vertex.display(),
            fragment.display(),
            handle.0
        );
        self.shaders.push(ShaderEntry {
            vertex: key.0.clone(),
            fragment: key.1.clone(),
            gpu,
        });
        self.shader_index.insert(key, handle);
        self.created.push(ResourceKind::Shader);
        Ok(handle)
    }

    pub fn shader(&self, handle: ShaderHandle) -> Option<&ShaderEntry<D::Shader>> {
        self.shaders.get(handle.0)
    }

    // ── Textures ─────────────────────────────────────────────────────────

    /// Load (or reuse) the texture decoded from an image file.
    pub fn load_texture(
        &mut self,
        device: &mut D,
        decoder: &dyn AssetDecoder,
        path: &Path,
    ) -> Result<TextureHandle, AssetError> {
        if let Some(&handle) = self.texture_index.get(path) {
            return Ok(handle);
        }

        let image = logged(decoder.decode_image(path))?;
        let gpu = device.create_texture(&path.display().to_string(), &image);

        let handle = TextureHandle(self.textures.len());
        log::info!(
            "Texture created (file: \"{}\") ({}x{}, {} channels) (id: {})",
            path.display(),
            image.width,
            image.height,
            image.channels,
            handle.0
        );
        self.textures.push(TextureEntry {
            path: path.to_path_buf(),
            gpu,
            width: image.width,
            height: image.height,
        });
        self.texture_index.insert(path.to_path_buf(), handle);
        self.created.push(ResourceKind::Texture);
        Ok(handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureEntry<D::Texture>> {
        self.textures.get(handle.0)
    }

    // ── Materials ────────────────────────────────────────────────────────

    /// Register a material by name. A name that already exists keeps its
    /// original texture.
    pub fn create_material(&mut self, name: &str, texture: TextureHandle) -> MaterialHandle {
        if let Some(&handle) = self.material_index.get(name) {
            return handle;
        }
        let handle = MaterialHandle(self.materials.len());
        self.materials.push(Material {
            name: name.to_owned(),
            texture,
        });
        self.material_index.insert(name.to_owned(), handle);
        handle
    }

    /// Load the material's texture (through the texture cache) and register it.
    pub fn load_material(
        &mut self,
        device: &mut D,
        decoder: &dyn AssetDecoder,
        source: &MaterialSource,
    ) -> Result<MaterialHandle, AssetError> {
        if let Some(&handle) = self.material_index.get(&source.name) {
            return Ok(handle);
        }
        let texture = self.load_texture(device, decoder, &source.base_color)?;
        Ok(self.create_material(&source.name, texture))
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.0)
    }

    // ── Meshes ───────────────────────────────────────────────────────────

    /// Load (or reuse) a model file: geometry plus its default and color
    /// variant materials.
    pub fn load_mesh(
        &mut self,
        device: &mut D,
        decoder: &dyn AssetDecoder,
        path: &Path,
    ) -> Result<MeshHandle, AssetError> {
        if let Some(&handle) = self.mesh_index.get(path) {
            return Ok(handle);
        }

        let data = logged(decoder.decode_model(path))?;

        let default_material = self.load_material(device, decoder, &data.default_material)?;
        let variants = match &data.variants {
            Some([white, black]) => Some([
                self.load_material(device, decoder, white)?,
                self.load_material(device, decoder, black)?,
            ]),
            None => None,
        };

        let gpu = device.create_mesh(&path.display().to_string(), &data.vertices, &data.indices);

        let handle = MeshHandle(self.meshes.len());
        log::info!(
            "Model created (file: \"{}\") ({} vertices, {} indices, {} materials)",
            path.display(),
            data.vertices.len(),
            data.indices.len(),
            if variants.is_some() { 3 } else { 1 }
        );
        self.meshes.push(MeshEntry {
            path: path.to_path_buf(),
            gpu,
            index_count: data.indices.len() as u32,
            default_material,
            variants,
        });
        self.mesh_index.insert(path.to_path_buf(), handle);
        self.created.push(ResourceKind::Mesh);
        Ok(handle)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshEntry<D::Mesh>> {
        self.meshes.get(handle.0)
    }

    // ── Lifetime ─────────────────────────────────────────────────────────

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Release every GPU resource, newest first.
    ///
    /// Within one kind, creation order equals index order, so walking the
    /// global order backwards always releases the last entry of that kind.
    pub fn teardown(&mut self, device: &mut D) {
        while let Some(kind) = self.created.pop() {
            match kind {
                ResourceKind::Shader => {
                    if let Some(entry) = self.shaders.pop() {
                        log::info!(
                            "Shader destroyed (vertex: \"{}\") (fragment: \"{}\")",
                            entry.vertex.display(),
                            entry.fragment.display()
                        );
                        device.destroy_shader(entry.gpu);
                    }
                }
                ResourceKind::Texture => {
                    if let Some(entry) = self.textures.pop() {
                        log::info!("Texture destroyed (file: \"{}\")", entry.path.display());
                        device.destroy_texture(entry.gpu);
                    }
                }
                ResourceKind::Mesh => {
                    if let Some(entry) = self.meshes.pop() {
                        log::info!("Model destroyed (file: \"{}\")", entry.path.display());
                        device.destroy_mesh(entry.gpu);
                    }
                }
            }
        }

        self.materials.clear();
        self.shader_index.clear();
        self.texture_index.clear();
        self.material_index.clear();
        self.mesh_index.clear();
    }
}

impl<D: ResourceDevice> Default for ResourceCache<D> {
    fn default() -> Self {
        Self::new()
    }
}

fn logged<T>(result: Result<T, AssetError>) -> Result<T, AssetError> {
    result.inspect_err(|e| log::error!("{e}"))
}
