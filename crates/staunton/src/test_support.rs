//! GPU-free doubles for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use glam::{Mat4, UVec2, Vec3};

use crate::asset::{
    AssetDecoder, DecodedImage, MaterialSource, ModelData, ResourceCache, ResourceDevice,
};
use crate::config::ViewerConfig;
use crate::error::AssetError;
use crate::picking::{decode_pixel, encode_id};
use crate::render::{DrawCommand, FrameUniforms, MeshVertex, PixelOrigin, RenderBackend};
use crate::scene::{MODEL_FILES, SHADER_PAIRS, TEXTURE_FILES};

pub fn frame_uniforms() -> FrameUniforms {
    FrameUniforms {
        view_proj: Mat4::IDENTITY,
        camera_position: Vec3::ZERO,
        light_position: Vec3::ZERO,
    }
}

fn not_found(path: &Path) -> AssetError {
    AssetError::Read {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, "not in fake decoder"),
    }
}

// ── Decoder ──────────────────────────────────────────────────────────────

/// In-memory decoder that records every path it is asked for.
#[derive(Default)]
pub struct FakeDecoder {
    texts: HashMap<PathBuf, String>,
    images: HashMap<PathBuf, DecodedImage>,
    models: HashMap<PathBuf, ModelData>,
    calls: RefCell<Vec<PathBuf>>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every shader, model, and texture the scene loads, resolved against
    /// `config`'s asset root. Piece models carry white/black variants.
    pub fn with_scene_assets(config: &ViewerConfig) -> Self {
        let mut decoder = Self::new();
        for (vertex, fragment) in SHADER_PAIRS {
            let vertex = config.shader_path(vertex);
            let fragment = config.shader_path(fragment);
            decoder.add_text(&vertex, &format!("// {}", vertex.display()));
            decoder.add_text(&fragment, &format!("// {}", fragment.display()));
        }
        for file in TEXTURE_FILES {
            decoder.add_image(config.texture_path(file), 2, 2);
        }
        let wood = config.texture_path("wood.png");
        let white = config.texture_path("white.png");
        let black = config.texture_path("black.png");
        for path in [&wood, &white, &black] {
            decoder.add_image(path, 4, 4);
        }
        for file in MODEL_FILES {
            let path = config.model_path(file);
            let default = (file, wood.to_str().unwrap_or_default());
            let variants = [
                ("white", white.to_str().unwrap_or_default()),
                ("black", black.to_str().unwrap_or_default()),
            ];
            decoder.add_model(path, default, Some(variants));
        }
        decoder
    }

    pub fn add_text(&mut self, path: impl AsRef<Path>, text: &str) {
        self.texts.insert(path.as_ref().to_path_buf(), text.to_owned());
    }

    pub fn add_image(&mut self, path: impl AsRef<Path>, width: u32, height: u32) {
        self.images.insert(
            path.as_ref().to_path_buf(),
            DecodedImage {
                width,
                height,
                channels: 4,
                pixels: vec![255; (width * height * 4) as usize],
            },
        );
    }

    /// A one-triangle model. Materials are `(name, base color path)`.
    pub fn add_model(
        &mut self,
        path: impl AsRef<Path>,
        default: (&str, &str),
        variants: Option<[(&str, &str); 2]>,
    ) {
        let source = |(name, texture): (&str, &str)| MaterialSource {
            name: name.to_owned(),
            base_color: PathBuf::from(texture),
        };
        let vertex = |x: f32, z: f32| MeshVertex {
            position: [x, 0.0, z],
            normal: [0.0, 1.0, 0.0],
            uv: [x, z],
        };
        self.models.insert(
            path.as_ref().to_path_buf(),
            ModelData {
                vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
                indices: vec![0, 1, 2],
                default_material: source(default),
                variants: variants.map(|[white, black]| [source(white), source(black)]),
            },
        );
    }

    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.texts.remove(path);
        self.images.remove(path);
        self.models.remove(path);
    }

    /// How many times `path` was requested, hit or miss.
    pub fn calls_for(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.calls.borrow().iter().filter(|p| p.as_path() == path).count()
    }

    fn record(&self, path: &Path) {
        self.calls.borrow_mut().push(path.to_path_buf());
    }
}

impl AssetDecoder for FakeDecoder {
    fn read_text(&self, path: &Path) -> Result<String, AssetError> {
        self.record(path);
        self.texts.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn decode_image(&self, path: &Path) -> Result<DecodedImage, AssetError> {
        self.record(path);
        self.images.get(path).cloned().ok_or_else(|| not_found(path))
    }

    fn decode_model(&self, path: &Path) -> Result<ModelData, AssetError> {
        self.record(path);
        self.models.get(path).cloned().ok_or_else(|| not_found(path))
    }
}

// ── Backend ──────────────────────────────────────────────────────────────

/// Records resource lifetimes and draw lists. The picking target is
/// simulated: each placed object covers one pixel and is visible only if
/// the last picking pass drew its ID.
pub struct FakeBackend {
    created: Vec<String>,
    destroyed: Vec<String>,
    failing_shader_text: Option<String>,
    origin: PixelOrigin,
    picking_size: UVec2,
    picking_recreations: usize,
    picking_draws: usize,
    picked_ids: HashSet<u32>,
    objects: HashMap<(u32, u32), u32>,
    pixel_reads: usize,
    surface_size: UVec2,
    presented: Vec<Vec<DrawCommand>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            created: Vec::new(),
            destroyed: Vec::new(),
            failing_shader_text: None,
            origin: PixelOrigin::TopLeft,
            picking_size: UVec2::ZERO,
            picking_recreations: 0,
            picking_draws: 0,
            picked_ids: HashSet::new(),
            objects: HashMap::new(),
            pixel_reads: 0,
            surface_size: UVec2::ZERO,
            presented: Vec::new(),
        }
    }

    /// Any shader whose source contains `text` fails to compile.
    pub fn fail_shaders_containing(&mut self, text: &str) {
        self.failing_shader_text = Some(text.to_owned());
    }

    pub fn set_pixel_origin(&mut self, origin: PixelOrigin) {
        self.origin = origin;
    }

    /// Pretend object `id` covers target pixel `(x, y)`.
    pub fn place_object(&mut self, x: u32, y: u32, id: u32) {
        self.objects.insert((x, y), id);
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
    }

    pub fn created_labels(&self) -> Vec<String> {
        self.created.clone()
    }

    pub fn destroyed_labels(&self) -> Vec<String> {
        self.destroyed.clone()
    }

    pub fn created_meshes(&self) -> usize {
        self.created.iter().filter(|l| l.starts_with("mesh:")).count()
    }

    pub fn picking_size(&self) -> UVec2 {
        self.picking_size
    }

    pub fn picking_recreations(&self) -> usize {
        self.picking_recreations
    }

    pub fn picking_draws(&self) -> usize {
        self.picking_draws
    }

    pub fn picked_ids(&self) -> &HashSet<u32> {
        &self.picked_ids
    }

    pub fn pixel_reads(&self) -> usize {
        self.pixel_reads
    }

    pub fn surface_size(&self) -> UVec2 {
        self.surface_size
    }

    pub fn last_presented(&self) -> Option<&[DrawCommand]> {
        self.presented.last().map(Vec::as_slice)
    }

    pub fn frames_presented(&self) -> usize {
        self.presented.len()
    }
}

impl ResourceDevice for FakeBackend {
    type Shader = String;
    type Texture = String;
    type Mesh = String;

    fn create_shader(
        &mut self,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<String, String> {
        if let Some(bad) = &self.failing_shader_text {
            if vertex_source.contains(bad.as_str()) || fragment_source.contains(bad.as_str()) {
                return Err(format!("error: unexpected token near \"{bad}\""));
            }
        }
        let label = format!("shader:{label}");
        self.created.push(label.clone());
        Ok(label)
    }

    fn create_texture(&mut self, label: &str, _image: &DecodedImage) -> String {
        let label = format!("texture:{label}");
        self.created.push(label.clone());
        label
    }

    fn create_mesh(&mut self, label: &str, _vertices: &[MeshVertex], _indices: &[u32]) -> String {
        let label = format!("mesh:{label}");
        self.created.push(label.clone());
        label
    }

    fn destroy_shader(&mut self, shader: String) {
        self.destroyed.push(shader);
    }

    fn destroy_texture(&mut self, texture: String) {
        self.destroyed.push(texture);
    }

    fn destroy_mesh(&mut self, mesh: String) {
        self.destroyed.push(mesh);
    }
}

impl RenderBackend for FakeBackend {
    fn recreate_picking_target(&mut self, size: UVec2) {
        self.picking_size = size;
        self.picking_recreations += 1;
        self.picked_ids.clear();
    }

    fn draw_picking(
        &mut self,
        _cache: &ResourceCache<Self>,
        _frame: &FrameUniforms,
        commands: &[DrawCommand],
    ) {
        self.picking_draws += 1;
        self.picked_ids = commands
            .iter()
            .filter_map(|cmd| {
                let bytes = (cmd.solid_color * 255.0).round();
                decode_pixel([bytes.x as u8, bytes.y as u8, bytes.z as u8, bytes.w as u8])
            })
            .collect();
    }

    fn read_picking_pixel(&mut self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.picking_size.x || y >= self.picking_size.y {
            return None;
        }
        self.pixel_reads += 1;
        let pixel = match self.objects.get(&(x, y)) {
            Some(id) if self.picked_ids.contains(id) => encode_id(*id),
            _ => [0; 4],
        };
        Some(pixel)
    }

    fn pixel_origin(&self) -> PixelOrigin {
        self.origin
    }

    fn resize(&mut self, size: UVec2) {
        self.surface_size = size;
    }

    fn present(
        &mut self,
        _cache: &ResourceCache<Self>,
        _frame: &FrameUniforms,
        commands: &[DrawCommand],
        _clear_color: [f64; 4],
    ) -> Result<(), wgpu::SurfaceError> {
        self.presented.push(commands.to_vec());
        Ok(())
    }
}
