//! Error types for the renderer

use thiserror::Error;

/// Errors raised while creating render resources or submitting draw calls.
///
/// Degenerate geometry and off-screen pixels are not errors: they are
/// skipped silently by the rasterizer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A buffer or texture was requested with a zero dimension.
    #[error("invalid dimensions {width}x{height}: both must be non-zero")]
    InvalidDimensions { width: usize, height: usize },

    /// Backing storage for a buffer could not be allocated.
    #[error("failed to allocate {what} ({cells} cells)")]
    Allocation { what: &'static str, cells: usize },

    /// The worker pool could not be started.
    #[error("failed to start pixel worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A draw call was submitted without a texture the shader needs.
    #[error("draw call rejected: missing {0} texture")]
    MissingTexture(&'static str),

    /// A texture could not be decoded or has an unusable layout.
    #[error("invalid texture {name}: {message}")]
    InvalidTexture { name: String, message: String },

    /// A mesh index points past the end of the vertex array.
    #[error("mesh index {index} out of range for {vertex_count} vertices")]
    MeshIndex { index: u32, vertex_count: usize },

    /// Depth buffer dimensions do not match the framebuffer.
    #[error("depth buffer is {depth:?} but framebuffer is {color:?}")]
    MismatchedTargets {
        color: (usize, usize),
        depth: (usize, usize),
    },
}
