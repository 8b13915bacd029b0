//! # Outline — Stencil-Masked Silhouettes
//!
//! A highlighted object is drawn twice:
//!
//! ```text
//!  pass 1 (opaque)                 pass 2 (outline)
//!  stencil: always, write 1        stencil: pass where != 1
//!  normal shading                  flat color, vertices pushed out
//!                                  along their normals
//!
//!     ┌─────┐                        ┌───────┐
//!     │11111│                        │ ┌───┐ │  ◄─ only the ring
//!     │11111│                        │ │   │ │     survives the test
//!     └─────┘                        │ └───┘ │
//!                                    └───────┘
//! ```
//!
//! Pass 1 happens inside the normal opaque pass, bracketed by
//! [`begin_stencil_writing`](RenderContext::begin_stencil_writing) and
//! [`end_stencil_writing`](RenderContext::end_stencil_writing). Every outline
//! is then drawn in one batch after all opaque geometry. Normal draws never
//! touch the stencil, so a silhouette written early in the frame is still
//! intact when its outline is drawn.

use glam::{Mat4, Vec4};

use crate::asset::{MeshHandle, ShaderHandle};
use crate::config::OutlineConfig;
use crate::render::RenderContext;

/// Thickness (model units along the normal) and color of an outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineStyle {
    pub thickness: f32,
    pub color: Vec4,
}

impl From<&OutlineConfig> for OutlineStyle {
    fn from(config: &OutlineConfig) -> Self {
        Self {
            thickness: config.thickness,
            color: config.color,
        }
    }
}

/// An object whose silhouette was written to the stencil buffer and still
/// needs its outline drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outlined {
    pub model: Mat4,
    pub mesh: MeshHandle,
}

/// Draw `mesh` with the currently bound shader and material, writing its
/// silhouette into the stencil buffer.
pub fn draw_silhouette(ctx: &mut RenderContext, model: Mat4, mesh: MeshHandle) -> Outlined {
    ctx.begin_stencil_writing();
    ctx.draw_model(model, mesh);
    ctx.end_stencil_writing();
    Outlined { model, mesh }
}

/// Draw the outline ring for every silhouette, then restore normal state.
pub fn draw_outlines(
    ctx: &mut RenderContext,
    outline_shader: ShaderHandle,
    style: OutlineStyle,
    outlined: &[Outlined],
) {
    if outlined.is_empty() {
        return;
    }
    ctx.bind_shader(outline_shader);
    ctx.unbind_material();
    ctx.begin_outline(style.thickness, style.color);
    for object in outlined {
        ctx.draw_model(object.model, object.mesh);
    }
    ctx.end_outline();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::StencilMode;

    const STYLE: OutlineStyle = OutlineStyle {
        thickness: 0.0125,
        color: Vec4::new(1.0, 0.76, 0.16, 1.0),
    };

    #[test]
    fn silhouette_then_outline() {
        let mut ctx = RenderContext::new();
        ctx.bind_shader(ShaderHandle(0));
        let model = Mat4::from_translation(glam::Vec3::X);
        let outlined = draw_silhouette(&mut ctx, model, MeshHandle(4));
        ctx.draw_model(Mat4::IDENTITY, MeshHandle(5));
        draw_outlines(&mut ctx, ShaderHandle(9), STYLE, &[outlined]);

        let cmds = ctx.commands();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].stencil, StencilMode::Write);
        assert_eq!(cmds[1].stencil, StencilMode::Normal, "plain draws leave stencil alone");

        let ring = cmds[2];
        assert_eq!(ring.shader, ShaderHandle(9));
        assert_eq!(ring.stencil, StencilMode::Outside);
        assert_eq!(ring.mesh, MeshHandle(4));
        assert_eq!(ring.model, model, "outline uses the same transform");
        assert_eq!(ring.outline_thickness, STYLE.thickness);
        assert_eq!(ring.solid_color, STYLE.color);
        assert_eq!(ctx.stencil(), StencilMode::Normal, "state restored afterwards");
    }

    #[test]
    fn nothing_to_outline_binds_nothing() {
        let mut ctx = RenderContext::new();
        draw_outlines(&mut ctx, ShaderHandle(9), STYLE, &[]);
        assert_eq!(ctx.bound_shader(), None);
        assert!(ctx.commands().is_empty());
    }
}
