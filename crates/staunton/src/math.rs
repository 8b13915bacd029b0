//! Math types, glam re-exports, and board geometry.
//!
//! The [`Transform`] type provides position, rotation, and scale for every
//! model in the scene. The free functions map board cells to world space and
//! trace the arc a moving piece follows.

pub use glam::{Mat4, Quat, UVec2, Vec2, Vec3, Vec4};

use crate::board::Cell;

/// Uniform scale applied to the board and every piece model.
pub const BOARD_SCALE: f32 = 10.0;

/// World-space center of cell a1's mirror corner, before scaling.
const BOARD_ORIGIN: Vec3 = Vec3::new(-2.03, 0.174, -2.03);

/// Distance between adjacent cell centers, before scaling.
const CELL_SPACING: f32 = 0.58;

/// A 3D transform: position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Return a copy rotated about the vertical axis by `degrees`.
    pub fn with_yaw_degrees(mut self, degrees: f32) -> Self {
        self.rotation = Quat::from_rotation_y(degrees.to_radians());
        self
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Compute the 4x4 model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// World-space position of a cell's center on the board surface.
///
/// Columns run right-to-left from the default camera's point of view, so
/// column 0 (file a) sits at the far +X edge.
pub fn cell_center(cell: Cell) -> Vec3 {
    let offset = Vec3::new(7.0 - cell.column() as f32, 0.0, cell.row() as f32) * CELL_SPACING;
    (BOARD_ORIGIN + offset) * BOARD_SCALE
}

/// A point on the vertical semicircle joining `from` and `to`.
///
/// ```text
///              angle = 90°
///                 ╭───╮
///               ╱       ╲
///  angle = 180° ●         ● angle = 0°
///             from        to
/// ```
///
/// The angle is measured from the `to` side, so sweeping it from 180° down
/// to 0° carries a point from `from` up over the top and down onto `to`.
pub fn arc_point(from: Vec3, to: Vec3, angle_degrees: f32) -> Vec3 {
    let center = (from + to) / 2.0;
    let radius = from.distance(to) / 2.0;
    if radius <= f32::EPSILON {
        return center;
    }
    let angle = angle_degrees.to_radians();
    let horizontal = (to - from).normalize() * angle.cos();
    center + Vec3::new(horizontal.x, angle.sin(), horizontal.z) * radius
}
