//! Edge-function triangle rasterizer
//!
//! Vertices are snapped to integer pixel coordinates and the inside test is
//! evaluated exactly on those. A pixel is covered when all three edge
//! values are `<= 0`, so front faces wind clockwise on screen (y down) and
//! clockwise as seen by the viewer in a right-handed world. Triangles with
//! the opposite winding produce no pixels.

use super::framebuffer::FrameBand;
use super::math::{edge, Weights};

/// Screen limit for snapped coordinates, keeps edge products in range
const COORD_LIMIT: f32 = (1 << 24) as f32;

/// A projected vertex: pixel position and normalized depth in (0,1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ScreenVertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Integer pixel position, clamped to the coordinate limit
    pub(crate) fn snapped(&self) -> (i32, i32) {
        (
            self.x.clamp(-COORD_LIMIT, COORD_LIMIT).floor() as i32,
            self.y.clamp(-COORD_LIMIT, COORD_LIMIT).floor() as i32,
        )
    }
}

/// How the depth of a covered pixel is reconstructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthInterpolation {
    /// `z = w0*z0 + w1*z1 + w2*z2`. Fragments get plain barycentrics.
    ScreenLinear,
    /// `1/z = w0/z0 + w1/z1 + w2/z2`. Fragments get depth-divided weights.
    PerspectiveCorrect,
}

/// Per-pixel color evaluator.
///
/// Shaders carry their per-triangle inputs by value, so one shader can be
/// invoked from every worker at once.
pub trait FragmentShader: Sync {
    fn shade(&self, weights: &Weights) -> u32;
}

impl<F> FragmentShader for F
where
    F: Fn(&Weights) -> u32 + Sync,
{
    fn shade(&self, weights: &Weights) -> u32 {
        self(weights)
    }
}

/// Fragment shader returning one packed color
#[derive(Debug, Clone, Copy)]
pub struct SolidColor(pub u32);

impl FragmentShader for SolidColor {
    fn shade(&self, _weights: &Weights) -> u32 {
        self.0
    }
}

/// Near/far reject: every vertex depth must lie in (0,1].
///
/// Stands in for frustum clipping; triangles crossing either plane are
/// dropped whole.
pub fn depth_in_range(v: &[ScreenVertex; 3]) -> bool {
    v.iter().all(|p| p.z > 0.0 && p.z <= 1.0)
}

/// Rasterize one triangle into `band`, returning the number of pixels written.
///
/// Only rows inside the band are visited, so bands drawn from separate
/// threads never touch the same pixel.
pub fn rasterize_triangle<S: FragmentShader + ?Sized>(
    band: &mut FrameBand<'_>,
    v: &[ScreenVertex; 3],
    mode: DepthInterpolation,
    shader: &S,
) -> usize {
    if !depth_in_range(v) {
        return 0;
    }

    let p0 = v[0].snapped();
    let p1 = v[1].snapped();
    let p2 = v[2].snapped();

    let area = edge(p0, p1, p2);
    // Positive area means back-facing: no pixel can have all edges <= 0
    if area >= 0 {
        return 0;
    }

    let min_x = p0.0.min(p1.0).min(p2.0).max(0);
    let max_x = p0.0.max(p1.0).max(p2.0).min(band.width as i32 - 1);
    let min_y = p0.1.min(p1.1).min(p2.1).max(band.bounds.y_start as i32);
    let max_y = p0.1.max(p1.1).max(p2.1).min(band.bounds.y_end as i32 - 1);
    if min_x > max_x || min_y > max_y {
        return 0;
    }

    let inv_area = 1.0 / area as f64;
    let z = [v[0].z, v[1].z, v[2].z];
    let mut written = 0;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = (x, y);
            let e0 = edge(p1, p2, p);
            let e1 = edge(p2, p0, p);
            let e2 = edge(p0, p1, p);
            if e0 > 0 || e1 > 0 || e2 > 0 {
                continue;
            }

            let b0 = (e0 as f64 * inv_area) as f32;
            let b1 = (e1 as f64 * inv_area) as f32;
            let b2 = (e2 as f64 * inv_area) as f32;

            let (inv_depth, weights) = match mode {
                DepthInterpolation::ScreenLinear => {
                    let depth = b0 * z[0] + b1 * z[1] + b2 * z[2];
                    (1.0 / depth, Weights::linear(b0, b1, b2))
                }
                DepthInterpolation::PerspectiveCorrect => {
                    let weights = Weights::perspective(b0, b1, b2, z);
                    (weights.w, weights)
                }
            };

            if band.write_if_nearer(x, y, inv_depth, || shader.shade(&weights)) {
                written += 1;
            }
        }
    }

    written
}
