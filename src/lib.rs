//! pbr-raster: CPU rasterizer with physically based shading
//!
//! - Edge-function triangle coverage with a reciprocal depth buffer
//! - Perspective-correct attribute interpolation
//! - Cook-Torrance metallic/roughness surface shading
//! - Cubemap skybox
//! - Band-partitioned parallel pixel filling
//! - Bresenham wireframe overlay

pub mod config;
pub mod error;
pub mod rasterizer;
pub mod renderer;
pub mod scene;
pub mod shading;

pub use config::{ConfigError, RenderSettings};
pub use error::RenderError;
pub use renderer::{FrameStats, PassStats, Renderer};

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
