//! # Pipeline — Layouts, Pipeline Variants, and Per-Draw Buffers
//!
//! wgpu bakes stencil, blend, and target format into the pipeline object, so
//! one shading mode turns into several pipelines:
//!
//! ```text
//!  PipelineKey { shader, target, stencil, blend }
//!      lit     Surface  Normal   false   ── board, plain pieces
//!      lit     Surface  Write    false   ── hovered/selected pieces
//!      outline Surface  Outside  false   ── outline rings
//!      unlit   Surface  Normal   true    ── selectable tiles
//!      solid   Picking  Normal   false   ── ID pass
//! ```
//!
//! They are built on first use and cached for the life of the backend. The
//! stencil reference is dynamic state and always set to 1.
//!
//! ## Depth-Stencil Buffer
//!
//! `Depth24PlusStencil8`: depth for occlusion, 8 stencil bits for the
//! silhouette mask. Cleared to depth 1.0 and stencil 0 every frame.

use crate::asset::ShaderHandle;
use crate::render::context::StencilMode;
use crate::render::vertex::{DrawUniformGpu, FrameUniformGpu, MeshVertex};

/// Depth-stencil format shared by the surface pass and the picking pass.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Picking color format. Unorm so encoded bytes are written back exactly.
pub(crate) const PICKING_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Value written into the stencil buffer under highlighted silhouettes.
pub(crate) const STENCIL_REFERENCE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum RenderTarget {
    Surface,
    Picking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub shader: ShaderHandle,
    pub target: RenderTarget,
    pub stencil: StencilMode,
    pub blend: bool,
}

/// Bind group layouts shared by every shading mode.
pub(crate) struct Layouts {
    pub frame: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub draw: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        // ── Group 0: Frame (per frame) ──────────────────────────────────
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<FrameUniformGpu>() as u64,
                    ),
                },
                count: None,
            }],
        });

        // ── Group 1: Material (per material) ────────────────────────────
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material layout"),
            entries: &[
                // base_color_texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                // sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // ── Group 2: Draw (per draw, dynamic offset) ────────────────────
        let draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniformGpu>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&frame, &material, &draw],
            push_constant_ranges: &[],
        });

        Self {
            frame,
            material,
            draw,
            pipeline,
        }
    }
}

fn stencil_state(mode: StencilMode) -> wgpu::StencilState {
    let face = |compare, pass_op| wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    match mode {
        StencilMode::Normal => wgpu::StencilState::default(),
        StencilMode::Write => {
            let write = face(wgpu::CompareFunction::Always, wgpu::StencilOperation::Replace);
            wgpu::StencilState {
                front: write,
                back: write,
                read_mask: 0xFF,
                write_mask: 0xFF,
            }
        }
        StencilMode::Outside => {
            let outside = face(wgpu::CompareFunction::NotEqual, wgpu::StencilOperation::Keep);
            wgpu::StencilState {
                front: outside,
                back: outside,
                read_mask: 0xFF,
                write_mask: 0x00,
            }
        }
    }
}

/// Build one pipeline variant for `module` (which holds `vs_main` and
/// `fs_main`).
pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    stencil: StencilMode,
    blend: bool,
) -> wgpu::RenderPipeline {
    // Outline rings and translucent tiles test depth but don't write it.
    let depth_write_enabled = !blend && stencil != StencilMode::Outside;

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mesh pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: stencil_state(stencil),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Create a depth-stencil texture at the given dimensions.
pub(crate) fn create_depth_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Dynamic uniform buffer holding one [`DrawUniformGpu`] per draw.
pub(crate) struct DrawBuffer {
    label: &'static str,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    capacity: usize,
}

impl DrawBuffer {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &'static str) -> Self {
        let capacity = 64;
        let (buffer, bind_group) = create_draw_buffer(device, layout, label, capacity);
        Self {
            label,
            buffer,
            bind_group,
            capacity,
        }
    }

    /// Ensure the buffer can hold `count` entries. Recreates if needed.
    /// Returns the aligned stride in bytes.
    pub fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        count: usize,
    ) -> u32 {
        if count > self.capacity {
            let new_cap = count.next_power_of_two();
            let (buffer, bind_group) = create_draw_buffer(device, layout, self.label, new_cap);
            self.buffer.destroy();
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = new_cap;
        }
        draw_stride(device) as u32
    }

    /// Pack `uniforms` at aligned offsets and upload them.
    pub fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        uniforms: &[DrawUniformGpu],
    ) -> u32 {
        if uniforms.is_empty() {
            return 0;
        }
        let stride = self.ensure_capacity(device, layout, uniforms.len());
        let mut data = vec![0u8; stride as usize * uniforms.len()];
        for (i, uniform) in uniforms.iter().enumerate() {
            let offset = i * stride as usize;
            let bytes = bytemuck::bytes_of(uniform);
            data[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &data);
        stride
    }
}

fn draw_stride(device: &wgpu::Device) -> usize {
    let align = device.limits().min_uniform_buffer_offset_alignment as usize;
    align_up(std::mem::size_of::<DrawUniformGpu>(), align)
}

fn create_draw_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let size = (draw_stride(device) * capacity) as u64;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniformGpu>() as u64),
            }),
        }],
    });

    (buffer, bind_group)
}

/// Round `value` up to the next multiple of `align`.
fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(96, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }

    #[test]
    fn stencil_states_match_their_mode() {
        let normal = stencil_state(StencilMode::Normal);
        assert_eq!(normal.write_mask, 0, "normal draws leave the stencil untouched");

        let write = stencil_state(StencilMode::Write);
        assert_eq!(write.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(write.front.pass_op, wgpu::StencilOperation::Replace);

        let outside = stencil_state(StencilMode::Outside);
        assert_eq!(outside.front.compare, wgpu::CompareFunction::NotEqual);
        assert_eq!(outside.write_mask, 0);
    }
}
