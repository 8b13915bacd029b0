//! # WgpuBackend — The Real GPU Side of [`RenderBackend`]
//!
//! ```text
//!  ResourceCache ──create_*──► GpuShader / GpuTexture / GpuMesh
//!
//!  present(commands)                     draw_picking(commands)
//!    ├─ write frame + draw uniforms        ├─ same uniforms, picking buffer
//!    ├─ clear color, depth 1, stencil 0    ├─ clear to id 0
//!    ├─ one draw per DrawCommand           ├─ one draw per DrawCommand
//!    └─ submit + present                   └─ submit + wait idle
//! ```
//!
//! Scene and picking draws use separate dynamic uniform buffers so a picking
//! rebuild in the middle of a frame never clobbers the scene's offsets.

use std::collections::HashMap;
use std::sync::Arc;

use glam::UVec2;
use wgpu::util::DeviceExt;

use super::backend::{PixelOrigin, RenderBackend};
use super::context::{DrawCommand, StencilMode};
use super::gpu::GpuContext;
use super::picking_target::PickingTarget;
use super::pipeline::{
    DrawBuffer, Layouts, PICKING_FORMAT, PipelineKey, RenderTarget, STENCIL_REFERENCE,
    build_pipeline, create_depth_texture,
};
use super::vertex::{DrawUniformGpu, FrameUniformGpu, FrameUniforms, MeshVertex};
use crate::asset::{DecodedImage, ResourceCache, ResourceDevice};
use crate::error::RenderError;

/// A compiled WGSL module holding both `vs_main` and `fs_main`.
pub struct GpuShader {
    module: wgpu::ShaderModule,
}

pub struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

pub struct WgpuBackend {
    gpu: GpuContext,
    layouts: Layouts,
    sampler: wgpu::Sampler,
    /// 1x1 white texture bound when a draw has no material.
    default_material: GpuTexture,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    scene_draws: DrawBuffer,
    picking_draws: DrawBuffer,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    depth_view: wgpu::TextureView,
    picking: Option<PickingTarget>,
}

impl WgpuBackend {
    pub fn new(window: Arc<winit::window::Window>) -> Result<Self, RenderError> {
        let gpu = GpuContext::new(window)?;
        let device = &gpu.device;

        let layouts = Layouts::new(device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let white = DecodedImage {
            width: 1,
            height: 1,
            channels: 4,
            pixels: vec![255; 4],
        };
        let default_material = upload_texture(&gpu, &layouts, &sampler, "default white", &white);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniform"),
            size: std::mem::size_of::<FrameUniformGpu>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let scene_draws = DrawBuffer::new(device, &layouts.draw, "scene draw uniforms");
        let picking_draws = DrawBuffer::new(device, &layouts.draw, "picking draw uniforms");

        let size = gpu.surface_size();
        let depth_view = create_depth_texture(device, "surface depth", size.x, size.y);

        Ok(Self {
            gpu,
            layouts,
            sampler,
            default_material,
            frame_buffer,
            frame_bind_group,
            scene_draws,
            picking_draws,
            pipelines: HashMap::new(),
            depth_view,
            picking: None,
        })
    }

    pub fn surface_size(&self) -> UVec2 {
        self.gpu.surface_size()
    }

    fn pipeline_key(command: &DrawCommand, target: RenderTarget) -> PipelineKey {
        match target {
            RenderTarget::Surface => PipelineKey {
                shader: command.shader,
                target,
                stencil: command.stencil,
                blend: command.blend,
            },
            RenderTarget::Picking => PipelineKey {
                shader: command.shader,
                target,
                stencil: StencilMode::Normal,
                blend: false,
            },
        }
    }

    /// Build any pipeline variant `commands` need that isn't cached yet.
    fn prepare_pipelines(
        &mut self,
        cache: &ResourceCache<Self>,
        target: RenderTarget,
        commands: &[DrawCommand],
    ) {
        for command in commands {
            let key = Self::pipeline_key(command, target);
            if self.pipelines.contains_key(&key) {
                continue;
            }
            let Some(shader) = cache.shader(command.shader) else {
                continue;
            };
            let format = match target {
                RenderTarget::Surface => self.gpu.surface_format(),
                RenderTarget::Picking => PICKING_FORMAT,
            };
            let pipeline = build_pipeline(
                &self.gpu.device,
                &self.layouts.pipeline,
                &shader.gpu.module,
                format,
                key.stencil,
                key.blend,
            );
            log::debug!("Built pipeline {key:?}");
            self.pipelines.insert(key, pipeline);
        }
    }

    fn write_uniforms(
        &mut self,
        frame: &FrameUniforms,
        target: RenderTarget,
        commands: &[DrawCommand],
    ) -> u32 {
        self.gpu.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame.to_gpu()));

        let uniforms: Vec<DrawUniformGpu> = commands
            .iter()
            .map(|c| DrawUniformGpu::new(c.model, c.solid_color, c.outline_thickness))
            .collect();
        let draws = match target {
            RenderTarget::Surface => &mut self.scene_draws,
            RenderTarget::Picking => &mut self.picking_draws,
        };
        draws.write(&self.gpu.device, &self.gpu.queue, &self.layouts.draw, &uniforms)
    }

    fn record_draws(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        cache: &ResourceCache<Self>,
        target: RenderTarget,
        commands: &[DrawCommand],
        stride: u32,
    ) {
        let draws = match target {
            RenderTarget::Surface => &self.scene_draws,
            RenderTarget::Picking => &self.picking_draws,
        };

        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_stencil_reference(STENCIL_REFERENCE);

        for (i, command) in commands.iter().enumerate() {
            let Some(pipeline) = self.pipelines.get(&Self::pipeline_key(command, target)) else {
                continue;
            };
            let Some(mesh) = cache.mesh(command.mesh) else {
                log::warn!("Draw references unknown mesh {:?}", command.mesh);
                continue;
            };
            let material = command
                .material
                .and_then(|m| cache.material(m))
                .and_then(|m| cache.texture(m.texture))
                .map_or(&self.default_material.bind_group, |t| &t.gpu.bind_group);

            pass.set_pipeline(pipeline);
            pass.set_bind_group(1, material, &[]);
            pass.set_bind_group(2, &draws.bind_group, &[i as u32 * stride]);
            pass.set_vertex_buffer(0, mesh.gpu.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.gpu.index_count, 0, 0..1);
        }
    }
}

fn upload_texture(
    gpu: &GpuContext,
    layouts: &Layouts,
    sampler: &wgpu::Sampler,
    label: &str,
    image: &DecodedImage,
) -> GpuTexture {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width.max(1),
                height: image.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &image.to_rgba8(),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.material,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        texture,
        bind_group,
    }
}

impl ResourceDevice for WgpuBackend {
    type Shader = GpuShader;
    type Texture = GpuTexture;
    type Mesh = GpuMesh;

    fn create_shader(
        &mut self,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<GpuShader, String> {
        let source = format!("{vertex_source}\n{fragment_source}");
        let device = &self.gpu.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        // Linking happens at pipeline creation, so build a throwaway one to
        // surface entry-point and interface mismatches now.
        let _probe = build_pipeline(
            device,
            &self.layouts.pipeline,
            &module,
            self.gpu.surface_format(),
            StencilMode::Normal,
            false,
        );
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(GpuShader { module }),
        }
    }

    fn create_texture(&mut self, label: &str, image: &DecodedImage) -> GpuTexture {
        upload_texture(&self.gpu, &self.layouts, &self.sampler, label, image)
    }

    fn create_mesh(&mut self, label: &str, vertices: &[MeshVertex], indices: &[u32]) -> GpuMesh {
        let device = &self.gpu.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn destroy_shader(&mut self, shader: GpuShader) {
        // Cached variants hold the module alive; drop them with it.
        self.pipelines.clear();
        drop(shader.module);
    }

    fn destroy_texture(&mut self, texture: GpuTexture) {
        texture.texture.destroy();
    }

    fn destroy_mesh(&mut self, mesh: GpuMesh) {
        mesh.vertex_buffer.destroy();
        mesh.index_buffer.destroy();
    }
}

impl RenderBackend for WgpuBackend {
    fn recreate_picking_target(&mut self, size: UVec2) {
        let unchanged = self
            .picking
            .as_ref()
            .is_some_and(|target| target.size() == size.max(UVec2::ONE));
        if unchanged {
            return;
        }
        if let Some(old) = self.picking.take() {
            old.destroy();
        }
        self.picking = Some(PickingTarget::new(&self.gpu.device, size));
    }

    fn draw_picking(
        &mut self,
        cache: &ResourceCache<Self>,
        frame: &FrameUniforms,
        commands: &[DrawCommand],
    ) {
        if self.picking.is_none() {
            log::warn!("Picking pass requested before the picking target exists");
            return;
        }
        self.prepare_pipelines(cache, RenderTarget::Picking, commands);
        let stride = self.write_uniforms(frame, RenderTarget::Picking, commands);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("picking encoder"),
            });
        if let Some(target) = &self.picking {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("picking pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(depth_stencil_attachment(&target.depth_view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.record_draws(&mut pass, cache, RenderTarget::Picking, commands, stride);
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        if let Err(e) = self.gpu.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("Picking pass poll failed: {e}");
        }
    }

    fn read_picking_pixel(&mut self, x: u32, y: u32) -> Option<[u8; 4]> {
        let target = self.picking.as_ref()?;
        target.read_pixel(&self.gpu.device, &self.gpu.queue, x, y)
    }

    fn pixel_origin(&self) -> PixelOrigin {
        PixelOrigin::TopLeft
    }

    fn resize(&mut self, size: UVec2) {
        if size.x == 0 || size.y == 0 {
            return;
        }
        self.gpu.resize(size);
        self.depth_view = create_depth_texture(&self.gpu.device, "surface depth", size.x, size.y);
    }

    fn present(
        &mut self,
        cache: &ResourceCache<Self>,
        frame: &FrameUniforms,
        commands: &[DrawCommand],
        clear_color: [f64; 4],
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.prepare_pipelines(cache, RenderTarget::Surface, commands);
        let stride = self.write_uniforms(frame, RenderTarget::Surface, commands);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene encoder"),
            });
        {
            let [r, g, b, a] = clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(depth_stencil_attachment(&self.depth_view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.record_draws(&mut pass, cache, RenderTarget::Surface, commands, stride);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn depth_stencil_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(0),
            store: wgpu::StoreOp::Store,
        }),
    }
}
