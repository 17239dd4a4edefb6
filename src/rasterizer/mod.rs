//! Software rasterizer
//!
//! Features:
//! - Exact integer edge-function coverage test
//! - Screen-linear or perspective-correct depth and attribute interpolation
//! - Reciprocal depth buffer (larger is nearer, cleared to 0)
//! - Band-partitioned parallel pixel filling
//! - Bresenham lines for wireframe overlays

mod framebuffer;
mod line;
mod math;
mod scheduler;
mod triangle;
mod types;

pub use framebuffer::*;
pub use line::*;
pub use math::*;
pub use scheduler::*;
pub use triangle::*;
pub use types::*;

/// Default viewport size
pub const WIDTH: usize = 800;
pub const HEIGHT: usize = 600;
