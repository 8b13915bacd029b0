//! # Decode — Files to CPU-Side Asset Data
//!
//! Decoders turn paths into plain data: shader text, RGBA-ish pixel bytes,
//! vertex/index streams plus material references. Nothing here knows about
//! the GPU.
//!
//! ## Model Topology
//!
//! Every model file is expected to hold exactly one object:
//!
//! ```text
//! scene
//!  └─ node (exactly one root, no children)
//!      └─ mesh
//!          └─ primitive (exactly one)
//!              ├─ material            → default material
//!              └─ variant mappings    → none, or exactly [white, black]
//! ```
//!
//! Anything else is rejected with [`AssetError::Malformed`]. The two color
//! variants come from the `KHR_materials_variants` extension: the first
//! mapping is the white material, the second the black one.
//!
//! ## What We Extract
//!
//! - **Positions**: `POSITION` (required)
//! - **Normals**: `NORMAL` (default +Y if absent)
//! - **UVs**: `TEXCOORD_0` (default [0,0] if absent)
//! - **Indices**: required
//! - **Materials**: name + base color texture URI, resolved relative to the
//!   model file. Embedded images are not supported.

use std::path::{Path, PathBuf};

use crate::error::AssetError;
use crate::render::vertex::MeshVertex;

/// Raw decoded pixels, `channels` bytes per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Expand to 4 bytes per pixel.
    ///
    /// Grey and grey-alpha replicate the grey value into RGB. Any other
    /// channel count means the decoder produced something we can't upload,
    /// and that is a bug, not a bad file.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let pixel_count = (self.width * self.height) as usize;
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        match self.channels {
            4 => rgba.extend_from_slice(&self.pixels),
            3 => {
                for px in self.pixels.chunks_exact(3) {
                    rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
            2 => {
                for px in self.pixels.chunks_exact(2) {
                    rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]);
                }
            }
            1 => {
                for &v in &self.pixels {
                    rgba.extend_from_slice(&[v, v, v, 255]);
                }
            }
            n => panic!("unsupported texture channel count {n}"),
        }
        rgba
    }
}

/// Where a material's base color comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSource {
    pub name: String,
    pub base_color: PathBuf,
}

/// One decoded model: geometry plus its material references.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub default_material: MaterialSource,
    /// `[white, black]` when the primitive declares color variants.
    pub variants: Option<[MaterialSource; 2]>,
}

/// Node/mesh/primitive counts of a model file, checked before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelTopology {
    pub root_nodes: usize,
    pub children: usize,
    pub meshes: usize,
    pub primitives: usize,
    pub mappings: usize,
}

impl ModelTopology {
    pub fn validate(&self) -> Result<(), String> {
        if self.root_nodes != 1 {
            return Err(format!("expected one root node, found {}", self.root_nodes));
        }
        if self.children != 0 {
            return Err(format!("root node has {} children, expected none", self.children));
        }
        if self.meshes != 1 {
            return Err("root node has no mesh".to_owned());
        }
        if self.primitives != 1 {
            return Err(format!("expected one primitive, found {}", self.primitives));
        }
        if self.mappings != 0 && self.mappings != 2 {
            return Err(format!(
                "expected zero or two material variants, found {}",
                self.mappings
            ));
        }
        Ok(())
    }
}

/// Turns asset paths into CPU-side data.
pub trait AssetDecoder {
    fn read_text(&self, path: &Path) -> Result<String, AssetError>;

    fn decode_image(&self, path: &Path) -> Result<DecodedImage, AssetError>;

    fn decode_model(&self, path: &Path) -> Result<ModelData, AssetError>;
}

/// Decodes from the filesystem with `image` and `gltf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDecoder;

impl AssetDecoder for FsDecoder {
    fn read_text(&self, path: &Path) -> Result<String, AssetError> {
        std::fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn decode_image(&self, path: &Path) -> Result<DecodedImage, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let img = image::load_from_memory(&bytes).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = (img.width(), img.height());
        let (channels, pixels) = match img.color().channel_count() {
            1 => (1, img.into_luma8().into_raw()),
            2 => (2, img.into_luma_alpha8().into_raw()),
            3 => (3, img.into_rgb8().into_raw()),
            _ => (4, img.into_rgba8().into_raw()),
        };

        Ok(DecodedImage {
            width,
            height,
            channels,
            pixels,
        })
    }

    fn decode_model(&self, path: &Path) -> Result<ModelData, AssetError> {
        let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Model {
            path: path.to_path_buf(),
            source,
        })?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| AssetError::malformed(path, "file contains no scene"))?;

        let roots: Vec<gltf::Node<'_>> = scene.nodes().collect();
        let mesh = roots.first().and_then(|node| node.mesh());
        let primitives: Vec<gltf::Primitive<'_>> =
            mesh.iter().flat_map(|mesh| mesh.primitives()).collect();
        let mappings: Vec<_> = primitives
            .first()
            .map(|primitive| primitive.mappings().collect())
            .unwrap_or_default();

        let topology = ModelTopology {
            root_nodes: roots.len(),
            children: roots.first().map_or(0, |node| node.children().count()),
            meshes: usize::from(mesh.is_some()),
            primitives: primitives.len(),
            mappings: mappings.len(),
        };
        topology
            .validate()
            .map_err(|reason| AssetError::malformed(path, reason))?;

        let Some(primitive) = primitives.first() else {
            return Err(AssetError::malformed(path, "mesh has no primitive"));
        };

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| AssetError::malformed(path, "primitive has no POSITION attribute"))?
            .collect();

        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

        if normals.len() != positions.len() || uvs.len() != positions.len() {
            return Err(AssetError::malformed(path, "vertex attribute streams differ in length"));
        }

        let vertices: Vec<MeshVertex> = positions
            .iter()
            .zip(&normals)
            .zip(&uvs)
            .map(|((position, normal), uv)| MeshVertex {
                position: *position,
                normal: *normal,
                uv: *uv,
            })
            .collect();

        let indices: Vec<u32> = reader
            .read_indices()
            .ok_or_else(|| AssetError::malformed(path, "primitive has no indices"))?
            .into_u32()
            .collect();

        let dir = path.parent().unwrap_or(Path::new(""));
        let default_material = material_source(path, dir, primitive.material())?;
        let variants = match mappings.as_slice() {
            [white, black] => Some([
                material_source(path, dir, white.material())?,
                material_source(path, dir, black.material())?,
            ]),
            _ => None,
        };

        Ok(ModelData {
            vertices,
            indices,
            default_material,
            variants,
        })
    }
}

/// Resolve a glTF material to its name and base color image path.
fn material_source(
    model: &Path,
    dir: &Path,
    material: gltf::Material<'_>,
) -> Result<MaterialSource, AssetError> {
    let name = match (material.name(), material.index()) {
        (Some(name), _) => name.to_owned(),
        (None, Some(index)) => format!("{}#{index}", model.display()),
        (None, None) => format!("{}#default", model.display()),
    };

    let info = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .ok_or_else(|| {
            AssetError::malformed(model, format!("material \"{name}\" has no base color texture"))
        })?;

    match info.texture().source().source() {
        gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => Ok(MaterialSource {
            name,
            base_color: dir.join(uri),
        }),
        _ => Err(AssetError::malformed(
            model,
            format!("material \"{name}\" uses an embedded image"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology() -> ModelTopology {
        ModelTopology {
            root_nodes: 1,
            children: 0,
            meshes: 1,
            primitives: 1,
            mappings: 0,
        }
    }

    #[test]
    fn single_node_single_primitive_is_valid() {
        assert!(topology().validate().is_ok());
        assert!(ModelTopology {
            mappings: 2,
            ..topology()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn extra_structure_is_rejected() {
        let cases = [
            ModelTopology { root_nodes: 2, ..topology() },
            ModelTopology { root_nodes: 0, ..topology() },
            ModelTopology { children: 1, ..topology() },
            ModelTopology { meshes: 0, ..topology() },
            ModelTopology { primitives: 2, ..topology() },
            ModelTopology { mappings: 1, ..topology() },
            ModelTopology { mappings: 3, ..topology() },
        ];
        for case in cases {
            assert!(case.validate().is_err(), "{case:?} should be rejected");
        }
    }

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        let img = DecodedImage {
            width: 2,
            height: 1,
            channels: 3,
            pixels: vec![1, 2, 3, 4, 5, 6],
        };
        assert_eq!(img.to_rgba8(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn grey_replicates_into_rgb() {
        let grey = DecodedImage {
            width: 1,
            height: 1,
            channels: 1,
            pixels: vec![9],
        };
        assert_eq!(grey.to_rgba8(), vec![9, 9, 9, 255]);

        let grey_alpha = DecodedImage {
            width: 1,
            height: 1,
            channels: 2,
            pixels: vec![9, 128],
        };
        assert_eq!(grey_alpha.to_rgba8(), vec![9, 9, 9, 128]);
    }

    #[test]
    fn rgba_passes_through() {
        let img = DecodedImage {
            width: 1,
            height: 1,
            channels: 4,
            pixels: vec![1, 2, 3, 4],
        };
        assert_eq!(img.to_rgba8(), vec![1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "unsupported texture channel count")]
    fn unknown_channel_count_panics() {
        let img = DecodedImage {
            width: 1,
            height: 1,
            channels: 5,
            pixels: vec![0; 5],
        };
        let _ = img.to_rgba8();
    }

    #[test]
    fn missing_files_report_their_path() {
        let decoder = FsDecoder;
        let path = Path::new("/no/such/shader.wgsl");
        match decoder.read_text(path) {
            Err(AssetError::Read { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected read error, got {other:?}"),
        }
        assert!(matches!(
            decoder.decode_image(Path::new("/no/such/image.png")),
            Err(AssetError::Read { .. })
        ));
        assert!(matches!(
            decoder.decode_model(Path::new("/no/such/model.gltf")),
            Err(AssetError::Model { .. })
        ));
    }
}
