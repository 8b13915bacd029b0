//! # Vertex — Mesh Vertices and Uniform Layouts
//!
//! ## Memory Layout
//!
//! ```text
//! MeshVertex (32 bytes)
//! ┌──────────────┬──────────────┬──────────────┐
//! │ position     │ normal       │ uv           │
//! │ [f32; 3]     │ [f32; 3]     │ [f32; 2]     │
//! │ offset 0     │ offset 12    │ offset 24    │
//! │ location(0)  │ location(1)  │ location(2)  │
//! └──────────────┴──────────────┴──────────────┘
//! ```
//!
//! The normal is load-bearing twice: the lit shading mode uses it for
//! diffuse/specular, and the outline shading mode extrudes every vertex along
//! it to grow the silhouette.
//!
//! ## Uniform Groups
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Group 0 — Frame (per frame)                                 │
//! │   view_proj: mat4x4  +  camera_pos: vec4  +  light_pos: vec4│
//! │   96 bytes                                                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Group 1 — Material (per material)                           │
//! │   base color texture + sampler                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Group 2 — Draw (per draw, dynamic offset)                   │
//! │   model: mat4x4  +  solid_color: vec4  +  params: vec4      │
//! │   96 bytes                                                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every shading mode shares this layout, so one pipeline layout serves
//! them all. Modes that don't sample a texture still get group 1 bound (the
//! 1x1 white default).

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-vertex data for meshes: position, surface normal, and texture UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position: vec3<f32>
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal: vec3<f32>
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv: vec2<f32>
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Camera and light data shared by every draw in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub light_position: Vec3,
}

impl FrameUniforms {
    pub(crate) fn to_gpu(self) -> FrameUniformGpu {
        FrameUniformGpu {
            view_proj: self.view_proj.to_cols_array_2d(),
            camera_pos: self.camera_position.extend(1.0).to_array(),
            light_pos: self.light_position.extend(1.0).to_array(),
        }
    }
}

/// GPU layout of [`FrameUniforms`].
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct FrameUniformGpu {
    pub view_proj: [[f32; 4]; 4], // 64 bytes
    pub camera_pos: [f32; 4],     // 16 bytes
    pub light_pos: [f32; 4],      // 16 bytes → total 96
}

/// Per-draw uniform, written at a dynamic offset.
///
/// `params.x` is the outline extrusion along the vertex normal. The other
/// lanes are padding.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct DrawUniformGpu {
    pub model: [[f32; 4]; 4],  // 64 bytes
    pub solid_color: [f32; 4], // 16 bytes
    pub params: [f32; 4],      // 16 bytes → total 96
}

impl DrawUniformGpu {
    pub fn new(model: Mat4, solid_color: Vec4, outline_thickness: f32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            solid_color: solid_color.to_array(),
            params: [outline_thickness, 0.0, 0.0, 0.0],
        }
    }
}
