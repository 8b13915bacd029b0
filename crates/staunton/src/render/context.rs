//! # Render Context — Bound State Without Globals
//!
//! Draw code never talks to the GPU. It binds a shader and a material on a
//! [`RenderContext`], adjusts stencil/blend/color state, and calls
//! [`draw_model`](RenderContext::draw_model). Each draw snapshots the current
//! state into a [`DrawCommand`]; the backend replays the list later.
//!
//! ```text
//!  bind_shader(lit) ─┐
//!  bind_material(m) ─┤  state   ──draw_model──►  DrawCommand { shader, mesh,
//!  begin_outline()  ─┘                            material, stencil, ... }
//! ```
//!
//! Binding what is already bound is elided and counted, which is what the
//! backend would otherwise do with redundant `set_pipeline` calls. The context
//! is reset at the start of every pass, so a pass must bind everything it
//! needs instead of relying on what an earlier pass left behind.

use glam::{Mat4, Vec4};

use crate::asset::{MaterialHandle, MeshHandle, ShaderHandle};

/// How a draw interacts with the stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilMode {
    /// Stencil ignored and left untouched.
    #[default]
    Normal,
    /// Always pass, write the reference value.
    Write,
    /// Pass only where the reference value was NOT written.
    Outside,
}

/// One recorded draw with every piece of state it depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub shader: ShaderHandle,
    pub mesh: MeshHandle,
    /// `None` samples the 1x1 white default.
    pub material: Option<MaterialHandle>,
    pub model: Mat4,
    pub solid_color: Vec4,
    pub outline_thickness: f32,
    pub stencil: StencilMode,
    pub blend: bool,
}

#[derive(Debug, Default)]
pub struct RenderContext {
    shader: Option<ShaderHandle>,
    material: Option<MaterialHandle>,
    stencil: StencilMode,
    blend: bool,
    solid_color: Vec4,
    outline_thickness: f32,
    commands: Vec<DrawCommand>,
    elided_binds: usize,
    dropped_draws: usize,
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            solid_color: Vec4::ONE,
            ..Self::default()
        }
    }

    /// Forget all bound state and recorded draws.
    pub fn reset(&mut self) {
        self.shader = None;
        self.material = None;
        self.stencil = StencilMode::Normal;
        self.blend = false;
        self.solid_color = Vec4::ONE;
        self.outline_thickness = 0.0;
        self.commands.clear();
        self.elided_binds = 0;
        self.dropped_draws = 0;
    }

    pub fn bind_shader(&mut self, shader: ShaderHandle) {
        if self.shader == Some(shader) {
            self.elided_binds += 1;
            return;
        }
        self.shader = Some(shader);
    }

    pub fn bind_material(&mut self, material: MaterialHandle) {
        if self.material == Some(material) {
            self.elided_binds += 1;
            return;
        }
        self.material = Some(material);
    }

    pub fn unbind_material(&mut self) {
        self.material = None;
    }

    pub fn bound_shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    pub fn bound_material(&self) -> Option<MaterialHandle> {
        self.material
    }

    pub fn set_solid_color(&mut self, color: Vec4) {
        self.solid_color = color;
    }

    /// Encode an object ID into the solid color for the picking pass.
    pub fn set_picking_id(&mut self, id: u32) {
        self.solid_color = crate::picking::encode_id_color(id);
    }

    // ── Stencil ──────────────────────────────────────────────────────────

    pub fn begin_stencil_writing(&mut self) {
        self.stencil = StencilMode::Write;
    }

    pub fn end_stencil_writing(&mut self) {
        self.stencil = StencilMode::Normal;
    }

    /// Extrude along normals by `thickness` in `color`, only outside the
    /// previously written silhouette.
    pub fn begin_outline(&mut self, thickness: f32, color: Vec4) {
        self.stencil = StencilMode::Outside;
        self.outline_thickness = thickness;
        self.solid_color = color;
    }

    pub fn end_outline(&mut self) {
        self.stencil = StencilMode::Normal;
        self.outline_thickness = 0.0;
        self.solid_color = Vec4::ONE;
    }

    pub fn stencil(&self) -> StencilMode {
        self.stencil
    }

    // ── Blending ─────────────────────────────────────────────────────────

    pub fn enable_blending(&mut self) {
        self.blend = true;
    }

    pub fn disable_blending(&mut self) {
        self.blend = false;
    }

    // ── Draws ────────────────────────────────────────────────────────────

    /// Record a draw of `mesh` with the current state.
    pub fn draw_model(&mut self, model: Mat4, mesh: MeshHandle) {
        let Some(shader) = self.shader else {
            log::warn!("Draw of mesh {} dropped: no shader bound", mesh.0);
            self.dropped_draws += 1;
            return;
        };
        self.commands.push(DrawCommand {
            shader,
            mesh,
            material: self.material,
            model,
            solid_color: self.solid_color,
            outline_thickness: self.outline_thickness,
            stencil: self.stencil,
            blend: self.blend,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn elided_binds(&self) -> usize {
        self.elided_binds
    }

    pub fn dropped_draws(&self) -> usize {
        self.dropped_draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_binds_are_elided() {
        let mut ctx = RenderContext::new();
        ctx.bind_shader(ShaderHandle(1));
        ctx.bind_shader(ShaderHandle(1));
        ctx.bind_material(MaterialHandle(0));
        ctx.bind_material(MaterialHandle(0));
        ctx.bind_shader(ShaderHandle(2));
        assert_eq!(ctx.elided_binds(), 2);
        assert_eq!(ctx.bound_shader(), Some(ShaderHandle(2)));
    }

    #[test]
    fn draw_snapshots_current_state() {
        let mut ctx = RenderContext::new();
        ctx.bind_shader(ShaderHandle(0));
        ctx.bind_material(MaterialHandle(3));
        ctx.begin_stencil_writing();
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(7));
        ctx.end_stencil_writing();
        ctx.enable_blending();
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(8));

        let [first, second] = ctx.commands() else {
            panic!("expected two commands");
        };
        assert_eq!(first.stencil, StencilMode::Write);
        assert!(!first.blend);
        assert_eq!(first.material, Some(MaterialHandle(3)));
        assert_eq!(second.stencil, StencilMode::Normal);
        assert!(second.blend);
    }

    #[test]
    fn outline_state_is_scoped() {
        let mut ctx = RenderContext::new();
        ctx.bind_shader(ShaderHandle(0));
        ctx.begin_outline(0.5, Vec4::new(1.0, 0.0, 0.0, 1.0));
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(0));
        ctx.end_outline();
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(0));

        let cmds = ctx.commands();
        assert_eq!(cmds[0].stencil, StencilMode::Outside);
        assert_eq!(cmds[0].outline_thickness, 0.5);
        assert_eq!(cmds[0].solid_color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(cmds[1].stencil, StencilMode::Normal);
        assert_eq!(cmds[1].outline_thickness, 0.0);
        assert_eq!(cmds[1].solid_color, Vec4::ONE);
    }

    #[test]
    fn draw_without_shader_is_dropped() {
        let mut ctx = RenderContext::new();
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(0));
        assert!(ctx.commands().is_empty());
        assert_eq!(ctx.dropped_draws(), 1);
    }

    #[test]
    fn reset_forgets_bindings() {
        let mut ctx = RenderContext::new();
        ctx.bind_shader(ShaderHandle(0));
        ctx.bind_material(MaterialHandle(0));
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(0));
        ctx.reset();
        assert!(ctx.commands().is_empty());
        assert_eq!(ctx.bound_shader(), None);
        assert_eq!(ctx.bound_material(), None);

        ctx.bind_shader(ShaderHandle(0));
        assert_eq!(ctx.elided_binds(), 0, "rebinding after reset is not redundant");
    }
}
