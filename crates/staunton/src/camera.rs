//! Orbit camera around the board.
//!
//! The camera is stored as spherical coordinates around a target point, so
//! dragging only changes two angles and zooming only changes a distance.
//!
//! ```text
//!                 y
//!                 │   ● camera
//!                 │  ╱
//!                 │ ╱ distance
//!                 │╱ pitch
//!   target ───────●──────── x
//!                ╱ yaw (from +z)
//!               z
//! ```

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Stops short of the poles so `look_at` never degenerates.
const MAX_PITCH: f32 = 89.0;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    /// Radians around +Y, measured from +Z.
    yaw: f32,
    /// Radians above the horizontal plane.
    pitch: f32,
    distance: f32,
    fov_y: f32,
    near: f32,
    far: f32,
    sensitivity: f32,
    min_distance: f32,
    max_distance: f32,
    zoom_step: f32,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let offset = config.position - config.target;
        let distance = offset.length().max(f32::EPSILON);
        let max_pitch = MAX_PITCH.to_radians();
        Self {
            target: config.target,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin().clamp(-max_pitch, max_pitch),
            distance,
            fov_y: config.fov_y,
            near: config.near,
            far: config.far,
            sensitivity: config.sensitivity,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            zoom_step: config.zoom_step,
        }
    }

    /// Rotate by a pointer drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let max_pitch = MAX_PITCH.to_radians();
        self.yaw -= (dx * self.sensitivity).to_radians();
        self.pitch = (self.pitch + (dy * self.sensitivity).to_radians()).clamp(-max_pitch, max_pitch);
    }

    /// Move closer for positive `scroll`, farther for negative.
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * self.zoom_step).max(0.0);
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn pitch_degrees(&self) -> f32 {
        self.pitch.to_degrees()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(&CameraConfig::default())
    }

    #[test]
    fn starts_at_configured_position() {
        let cam = camera();
        assert!(cam.position().distance(Vec3::new(0.0, 40.0, -40.0)) < 1e-3);
        assert!((cam.pitch_degrees() - 45.0).abs() < 1e-3);
    }

    #[test]
    fn horizontal_drag_keeps_height_and_distance() {
        let mut cam = camera();
        let before = cam.position();
        cam.orbit(100.0, 0.0);
        let after = cam.position();
        assert!((after.y - before.y).abs() < 1e-3);
        assert!((after.length() - before.length()).abs() < 1e-3);
        assert!(after.distance(before) > 1.0);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_pole() {
        let mut cam = camera();
        cam.orbit(0.0, 10_000.0);
        assert!(cam.pitch_degrees() <= MAX_PITCH + 1e-3);
        cam.orbit(0.0, -100_000.0);
        assert!(cam.pitch_degrees() >= -MAX_PITCH - 1e-3);
        assert!(cam.view_matrix().is_finite());
    }

    #[test]
    fn zoom_respects_limits() {
        let mut cam = camera();
        let start = cam.distance();
        cam.zoom(1.0);
        assert!(cam.distance() < start);
        for _ in 0..100 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.distance(), 15.0);
        for _ in 0..100 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance(), 100.0);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let cam = camera();
        let clip = cam.view_projection(16.0 / 9.0) * cam.target().extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }
}
