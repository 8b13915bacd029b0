//! Error types.
//!
//! Everything that can go wrong before the first frame is an error value and
//! propagates to `main`. Once the frame loop is running, the only failures are
//! "nothing under the cursor" or "that move isn't legal", which are modelled as
//! `Option` and no-ops, never as errors.

use std::path::PathBuf;

/// A resource failed to load. Fatal when it happens during startup.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image \"{}\": {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to load model \"{}\": {source}", path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("malformed model \"{}\": {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error(
        "failed to build shader (vertex: \"{}\") (fragment: \"{}\"):\n{log}",
        vertex.display(),
        fragment.display()
    )]
    Shader {
        vertex: PathBuf,
        fragment: PathBuf,
        log: String,
    },
}

impl AssetError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// The configuration file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config \"{}\": {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config \"{}\": {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid start position \"{fen}\": {reason}")]
    Fen { fen: String, reason: String },

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// GPU initialization failed.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Anything that stops the viewer from reaching its frame loop.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
