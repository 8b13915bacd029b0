//! # Config — Viewer Settings From JSON
//!
//! Every knob the viewer exposes lives in [`ViewerConfig`]. The struct is
//! `serde`-derived with `#[serde(default)]` on every level, so any subset of
//! fields can be given and the rest fall back to the built-in defaults:
//!
//! ```json
//! {
//!   "window": { "width": 1920, "height": 1080 },
//!   "animation": { "rate": 360.0 },
//!   "opponent": { "enabled": false }
//! }
//! ```
//!
//! ## Lookup Order
//!
//! 1. The path passed on the command line, if any. A missing file here is an
//!    error: the user asked for it explicitly.
//! 2. `staunton.json` in the working directory, if it exists.
//! 3. [`ViewerConfig::default`].

use std::path::{Path, PathBuf};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "staunton.json";

/// Top-level viewer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    /// Directory containing `shaders/`, `models/`, and `textures/`.
    pub asset_root: PathBuf,
    pub clear_color: [f64; 4],
    pub light_position: Vec3,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
    pub outline: OutlineConfig,
    pub opponent: OpponentConfig,
    /// Position loaded at startup and on reset. `None` is the standard start.
    pub start_fen: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            asset_root: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets")),
            clear_color: [0.25, 0.25, 0.25, 1.0],
            light_position: Vec3::new(0.0, 50.0, -20.0),
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
            outline: OutlineConfig::default(),
            opponent: OpponentConfig::default(),
            start_fen: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Staunton".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

/// Orbit camera placement and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees of orbit per pixel of pointer motion.
    pub sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the current distance removed per scroll step.
    pub zoom_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 40.0, -40.0),
            target: Vec3::ZERO,
            fov_y: 60.0,
            near: 0.1,
            far: 125.0,
            sensitivity: 0.25,
            min_distance: 15.0,
            max_distance: 100.0,
            zoom_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Arc angle consumed per second, in degrees. A move sweeps 180°.
    pub rate: f32,
    /// Upper bound on a single frame's delta time, in seconds.
    pub max_frame_delta: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            rate: 270.0,
            max_frame_delta: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Extrusion along vertex normals, in model units (before the board scale).
    pub thickness: f32,
    pub color: Vec4,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            thickness: 0.0125,
            color: Vec4::new(1.0, 0.76, 0.16, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentConfig {
    pub enabled: bool,
    /// Fixed RNG seed for reproducible games. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
        }
    }
}

impl ViewerConfig {
    /// Load the configuration following the lookup order described above.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            return Self::from_file(fallback);
        }

        log::info!("No {DEFAULT_CONFIG_FILE} found, using default configuration");
        Ok(Self::default())
    }

    /// Read, parse, and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&json, path)?;
        log::info!("Loaded configuration from \"{}\"", path.display());
        Ok(config)
    }

    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::parse(json, Path::new("<inline>"))
    }

    fn parse(json: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the frame loop and camera cannot run with. The
    /// comparisons are written so that NaN fails them too.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| Err(ConfigError::Invalid { field, reason });

        let animation = &self.animation;
        if !(animation.rate > 0.0 && animation.rate.is_finite()) {
            return invalid("animation.rate", format!("{} must be positive", animation.rate));
        }
        if !(animation.max_frame_delta > 0.0) {
            return invalid(
                "animation.max_frame_delta",
                format!("{} must be positive", animation.max_frame_delta),
            );
        }

        let camera = &self.camera;
        if !(camera.min_distance > 0.0) {
            return invalid(
                "camera.min_distance",
                format!("{} must be positive", camera.min_distance),
            );
        }
        if !(camera.min_distance <= camera.max_distance) {
            return invalid(
                "camera.max_distance",
                format!(
                    "{} is below min_distance {}",
                    camera.max_distance, camera.min_distance
                ),
            );
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return invalid(
                "camera.near",
                format!("{} must lie in (0, far = {})", camera.near, camera.far),
            );
        }
        Ok(())
    }

    pub fn shader_path(&self, file: &str) -> PathBuf {
        self.asset_root.join("shaders").join(file)
    }

    pub fn model_path(&self, file: &str) -> PathBuf {
        self.asset_root.join("models").join(file)
    }

    pub fn texture_path(&self, file: &str) -> PathBuf {
        self.asset_root.join("textures").join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.animation.rate, 270.0);
        assert_eq!(config.outline.thickness, 0.0125);
        assert!(config.opponent.enabled);
        assert!(config.start_fen.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "window": { "width": 1920 }, "opponent": { "seed": 7 } }"#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.window.height, 720, "unspecified field should default");
        assert_eq!(config.opponent.seed, Some(7));
        assert!(config.opponent.enabled);
    }

    #[test]
    fn vectors_parse_from_arrays() {
        let config =
            ViewerConfig::from_json(r#"{ "camera": { "position": [1.0, 2.0, 3.0] } }"#).unwrap();
        assert_eq!(config.camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.camera.fov_y, 60.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_json("{ window: "),
            Err(ConfigError::Parse { .. })
        ));
    }

    fn rejected_field(json: &str) -> &'static str {
        match ViewerConfig::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected a validation error for {json}, got {other:?}"),
        }
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(ViewerConfig::default().validate().is_ok());
    }

    #[test]
    fn non_positive_animation_rate_is_rejected() {
        assert_eq!(rejected_field(r#"{ "animation": { "rate": -5 } }"#), "animation.rate");
        assert_eq!(rejected_field(r#"{ "animation": { "rate": 0 } }"#), "animation.rate");
    }

    #[test]
    fn non_positive_frame_delta_is_rejected() {
        assert_eq!(
            rejected_field(r#"{ "animation": { "max_frame_delta": -1 } }"#),
            "animation.max_frame_delta"
        );
        assert_eq!(
            rejected_field(r#"{ "animation": { "max_frame_delta": 0 } }"#),
            "animation.max_frame_delta"
        );
    }

    #[test]
    fn inverted_zoom_limits_are_rejected() {
        assert_eq!(
            rejected_field(r#"{ "camera": { "min_distance": 100, "max_distance": 15 } }"#),
            "camera.max_distance"
        );
        assert_eq!(
            rejected_field(r#"{ "camera": { "min_distance": 0 } }"#),
            "camera.min_distance"
        );
    }

    #[test]
    fn equal_zoom_limits_are_allowed() {
        let config =
            ViewerConfig::from_json(r#"{ "camera": { "min_distance": 40, "max_distance": 40 } }"#)
                .unwrap();
        assert_eq!(config.camera.min_distance, 40.0);
    }

    #[test]
    fn near_plane_must_precede_far_plane() {
        assert_eq!(rejected_field(r#"{ "camera": { "near": 200 } }"#), "camera.near");
        assert_eq!(
            rejected_field(r#"{ "camera": { "near": 10, "far": 10 } }"#),
            "camera.near"
        );
    }

    #[test]
    fn bad_values_in_several_sections_fail_to_load() {
        let json = r#"{
            "animation": { "rate": -5, "max_frame_delta": -1 },
            "camera": { "min_distance": 100, "max_distance": 15 }
        }"#;
        assert!(ViewerConfig::from_json(json).is_err());
    }

    #[test]
    fn invalid_file_fails_to_load() {
        let path = std::env::temp_dir().join(format!("staunton-invalid-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "animation": { "max_frame_delta": -1 } }"#).unwrap();
        let result = ViewerConfig::load(Some(&path));
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "animation.max_frame_delta", .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = ViewerConfig::load(Some(Path::new("/definitely/not/here.json")))
            .expect_err("explicit path must exist");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn asset_paths_join_under_root() {
        let config = ViewerConfig {
            asset_root: PathBuf::from("data"),
            ..Default::default()
        };
        assert_eq!(config.shader_path("mesh.vert.wgsl"), Path::new("data/shaders/mesh.vert.wgsl"));
        assert_eq!(config.model_path("king.gltf"), Path::new("data/models/king.gltf"));
        assert_eq!(config.texture_path("tile.png"), Path::new("data/textures/tile.png"));
    }
}
