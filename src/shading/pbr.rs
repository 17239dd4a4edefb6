//! Cook-Torrance surface shading
//!
//! Metallic/roughness workflow with a single fixed directional light:
//! GGX distribution, Smith/Schlick-GGX self shadowing and Fresnel-Schlick,
//! plus a Lambert diffuse lobe and a flat ambient term.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::rasterizer::{gamma_decode, gamma_encode, pack_rgb, FilterMode, FragmentShader, Texture, Weights};

/// Reflectance of dielectrics at normal incidence
pub const DIELECTRIC_F0: f32 = 0.04;
/// Fraction of albedo added regardless of lighting
pub const AMBIENT: f32 = 0.05;
/// Keeps the specular denominator away from zero at grazing angles
pub const SPECULAR_EPSILON: f32 = 0.001;

/// Direction towards the light, normalize(1, 1, 1)
pub fn light_direction() -> Vec3 {
    Vec3::ONE.normalize()
}

/// Trowbridge-Reitz GGX normal distribution
pub fn normal_distribution(n_dot_h: f32, roughness: f32) -> f32 {
    let r4 = roughness * roughness * roughness * roughness;
    let b = n_dot_h * n_dot_h * (r4 - 1.0) + 1.0;
    r4 / (PI * b * b).max(f32::MIN_POSITIVE)
}

pub fn schlick_ggx(dot: f32, k: f32) -> f32 {
    dot / (dot * (1.0 - k) + k).max(f32::MIN_POSITIVE)
}

/// Smith joint self-shadowing with `k = roughness^2 / 2`
pub fn self_shadowing(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    let k = roughness * roughness / 2.0;
    schlick_ggx(n_dot_v, k) * schlick_ggx(n_dot_l, k)
}

/// Fresnel-Schlick. Base reflectance is 0.04 mixed toward albedo by metalness.
pub fn fresnel(h_dot_v: f32, albedo: Vec3, metalness: f32) -> Vec3 {
    let f0 = Vec3::splat(DIELECTRIC_F0).lerp(albedo, metalness);
    f0 + (Vec3::ONE - f0) * (1.0 - h_dot_v).clamp(0.0, 1.0).powi(5)
}

/// Textures a surface draw call samples
#[derive(Clone, Copy)]
pub struct SurfaceTextures<'a> {
    pub albedo: &'a Texture,
    /// Green channel is roughness, blue is metalness
    pub metallic_roughness: &'a Texture,
    /// Bound with the material; surfaces are shaded with interpolated
    /// vertex normals only
    pub normal: &'a Texture,
}

/// Per-triangle inputs of the surface shader
#[derive(Clone, Copy)]
pub struct SurfaceShader<'a> {
    pub textures: SurfaceTextures<'a>,
    pub filter: FilterMode,
    pub camera_position: Vec3,
    /// World-space vertex positions
    pub positions: [Vec3; 3],
    pub texcoords: [Vec2; 3],
    /// World-space vertex normals, expected normalized
    pub normals: [Vec3; 3],
}

impl FragmentShader for SurfaceShader<'_> {
    fn shade(&self, w: &Weights) -> u32 {
        let s = w.scalar([self.texcoords[0].x, self.texcoords[1].x, self.texcoords[2].x]).min(1.0);
        let t = w.scalar([self.texcoords[0].y, self.texcoords[1].y, self.texcoords[2].y]).min(1.0);

        let albedo = gamma_decode(self.textures.albedo.sample(s, t, self.filter));
        let mr = self.textures.metallic_roughness.sample(s, t, self.filter);
        let roughness = mr.y;
        let metalness = mr.z;

        let n = w.blend3(self.normals).normalize_or_zero();
        let position = w.vec3(self.positions);

        let view = (self.camera_position - position).normalize_or_zero();
        let light = light_direction();
        let halfway = (view + light).normalize_or_zero();

        let n_dot_h = n.dot(halfway).max(0.0);
        let n_dot_v = n.dot(view).max(0.0);
        let n_dot_l = n.dot(light).max(0.0);
        let h_dot_v = halfway.dot(view).max(0.0);

        let d = normal_distribution(n_dot_h, roughness);
        let g = self_shadowing(n_dot_v, n_dot_l, roughness);
        let f = fresnel(h_dot_v, albedo, metalness);
        let specular = f * (d * g / (4.0 * n_dot_l * n_dot_v + SPECULAR_EPSILON));

        let kd = (Vec3::ONE - f) * (1.0 - metalness) / PI;
        let diffuse = albedo * kd;

        let color = (diffuse + specular) * n_dot_l + albedo * AMBIENT;
        pack_rgb(gamma_encode(color))
    }
}
