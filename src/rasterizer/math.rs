//! Rasterization math: edge functions, barycentric weights and color packing
//!
//! Vector and matrix types come from `glam`; this module only holds the
//! pieces specific to turning triangles into pixels.

use glam::Vec3;

/// Gamma used to decode albedo textures and encode the final color
pub const GAMMA: f32 = 2.2;

/// Signed parallelogram area of (a, b, p).
///
/// `edge(a, b, p) = (p.x - a.x)(b.y - a.y) - (b.x - a.x)(p.y - a.y)`.
/// Computed on integer pixel coordinates in 64 bits so the inside test
/// is exact for any on-screen triangle.
#[inline]
pub fn edge(a: (i32, i32), b: (i32, i32), p: (i32, i32)) -> i64 {
    let (ax, ay) = (a.0 as i64, a.1 as i64);
    let (bx, by) = (b.0 as i64, b.1 as i64);
    let (px, py) = (p.0 as i64, p.1 as i64);
    (px - ax) * (by - ay) - (bx - ax) * (py - ay)
}

/// Interpolation weights handed to a fragment shader.
///
/// For screen-linear interpolation `w0..w2` are the plain barycentric
/// coordinates and `w` is 1. For perspective-correct interpolation each
/// weight is pre-divided by its vertex depth and `w` is their sum, so an
/// attribute is recovered as `(a0*w0 + a1*w1 + a2*w2) / w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub w0: f32,
    pub w1: f32,
    pub w2: f32,
    pub w: f32,
}

impl Weights {
    pub fn linear(b0: f32, b1: f32, b2: f32) -> Self {
        Self { w0: b0, w1: b1, w2: b2, w: 1.0 }
    }

    /// Weights for a triangle whose vertex depths are `z0..z2`
    pub fn perspective(b0: f32, b1: f32, b2: f32, z: [f32; 3]) -> Self {
        let w0 = b0 / z[0];
        let w1 = b1 / z[1];
        let w2 = b2 / z[2];
        Self { w0, w1, w2, w: w0 + w1 + w2 }
    }

    /// Perspective-correct interpolation of a scalar attribute
    #[inline]
    pub fn scalar(&self, a: [f32; 3]) -> f32 {
        (a[0] * self.w0 + a[1] * self.w1 + a[2] * self.w2) / self.w
    }

    /// Perspective-correct interpolation of a vector attribute
    #[inline]
    pub fn vec3(&self, a: [Vec3; 3]) -> Vec3 {
        (a[0] * self.w0 + a[1] * self.w1 + a[2] * self.w2) / self.w
    }

    /// Weighted sum without the final divide (for directions that get normalized)
    #[inline]
    pub fn blend3(&self, a: [Vec3; 3]) -> Vec3 {
        a[0] * self.w0 + a[1] * self.w1 + a[2] * self.w2
    }
}

/// Pack a linear [0,1] RGB triple into the framebuffer format (RGBA8888, alpha opaque)
pub fn pack_rgb(c: Vec3) -> u32 {
    let r = (c.x.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    let g = (c.y.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    let b = (c.z.clamp(0.0, 1.0) * 255.0 + 0.5) as u32;
    (r << 24) | (g << 16) | (b << 8) | 0xFF
}

/// Unpack a framebuffer pixel into an RGB triple in [0,1]
pub fn unpack_rgb(p: u32) -> Vec3 {
    Vec3::new(
        ((p >> 24) & 0xFF) as f32 / 255.0,
        ((p >> 16) & 0xFF) as f32 / 255.0,
        ((p >> 8) & 0xFF) as f32 / 255.0,
    )
}

#[inline]
pub fn gamma_decode(c: Vec3) -> Vec3 {
    c.powf(GAMMA)
}

#[inline]
pub fn gamma_encode(c: Vec3) -> Vec3 {
    c.max(Vec3::ZERO).powf(1.0 / GAMMA)
}
