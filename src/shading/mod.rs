//! Vertex and fragment stages
//!
//! Fragment shaders are plain values holding one triangle's uniforms
//! (textures, vertex attributes, camera position). Workers share them by
//! reference while that triangle is rasterized.

mod pbr;
mod skybox;

pub use pbr::*;
pub use skybox::*;

use glam::{Mat3, Mat4, Vec4};

use crate::rasterizer::ScreenVertex;
use crate::scene::Camera;

/// Clip-space transform plus viewport mapping for one draw call
#[derive(Debug, Clone, Copy)]
pub struct VertexStage {
    pub mvp: Mat4,
    pub width: usize,
    pub height: usize,
}

impl VertexStage {
    /// `Projection * View * Model`
    pub fn surface(camera: &Camera, model: Mat4, width: usize, height: usize) -> Self {
        Self {
            mvp: camera.projection_matrix() * camera.view_matrix() * model,
            width,
            height,
        }
    }

    /// Skybox variant. With `strip_translation` the view keeps only its
    /// rotation, so the box stays centered on the camera.
    pub fn skybox(camera: &Camera, model: Mat4, strip_translation: bool, width: usize, height: usize) -> Self {
        let view = if strip_translation {
            Mat4::from_mat3(Mat3::from_mat4(camera.view_matrix()))
        } else {
            camera.view_matrix()
        };
        Self {
            mvp: camera.projection_matrix() * view * model,
            width,
            height,
        }
    }

    pub fn clip(&self, position: Vec4) -> Vec4 {
        self.mvp * position
    }

    /// Clip space to pixels. Points on or behind the eye plane get an
    /// infinite depth so the near/far reject drops their triangle.
    pub fn to_screen(&self, clip: Vec4) -> ScreenVertex {
        if clip.w <= f32::EPSILON {
            return ScreenVertex::new(0.0, 0.0, f32::INFINITY);
        }
        let ndc = clip / clip.w;
        ScreenVertex::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32,
            ndc.z,
        )
    }

    pub fn project(&self, position: Vec4) -> ScreenVertex {
        self.to_screen(self.clip(position))
    }
}
