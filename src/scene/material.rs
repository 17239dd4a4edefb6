//! Surface materials and skybox textures

use std::path::Path;

use glam::{Vec2, Vec3};

use super::Mesh;
use crate::error::RenderError;
use crate::rasterizer::{Color, Texture};
use crate::shading::{CubeFace, SurfaceTextures};

/// Textures of a metallic/roughness material.
///
/// All three must be present for a surface draw call to go through.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub albedo: Option<Texture>,
    pub metallic_roughness: Option<Texture>,
    pub normal: Option<Texture>,
}

impl Material {
    /// Borrow the texture set for shading, or name the first missing one
    pub fn textures(&self) -> Result<SurfaceTextures<'_>, RenderError> {
        Ok(SurfaceTextures {
            albedo: self.albedo.as_ref().ok_or(RenderError::MissingTexture("albedo"))?,
            metallic_roughness: self
                .metallic_roughness
                .as_ref()
                .ok_or(RenderError::MissingTexture("metallic-roughness"))?,
            normal: self.normal.as_ref().ok_or(RenderError::MissingTexture("normal"))?,
        })
    }

    /// Load `albedo.png`, `metallic_roughness.png` and `normal.png` from a
    /// directory. Files that fail to load stay unset.
    pub fn from_directory<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let load = |file: &str| match Texture::from_file(dir.join(file)) {
            Ok(tex) => Some(tex),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };
        Self {
            albedo: load("albedo.png"),
            metallic_roughness: load("metallic_roughness.png"),
            normal: load("normal.png"),
        }
    }

    /// Checkered half-metal material that needs no assets
    pub fn procedural() -> Self {
        Self {
            albedo: Some(Texture::checkerboard(
                64,
                64,
                Color::new(200, 160, 90),
                Color::new(60, 90, 160),
            )),
            // roughness in green, metalness in blue
            metallic_roughness: Some(Texture::solid(Color::new(0, 110, 128), "metallic_roughness")),
            normal: Some(Texture::solid(Color::new(128, 128, 255), "normal")),
        }
    }
}

/// Cubemap faces plus the cube mesh they are drawn on
pub struct Skybox {
    /// Indexed by `CubeFace::index`
    pub faces: [Texture; 6],
    pub mesh: Mesh,
}

impl Skybox {
    /// Face file names in `CubeFace` order
    pub const FACE_FILES: [&'static str; 6] = [
        "right.png",
        "left.png",
        "top.png",
        "bottom.png",
        "front.png",
        "back.png",
    ];

    pub fn new(faces: [Texture; 6], subdivisions: usize) -> Self {
        Self {
            faces,
            mesh: Mesh::skybox_cube(subdivisions),
        }
    }

    pub fn from_directory<P: AsRef<Path>>(dir: P, subdivisions: usize) -> Result<Self, RenderError> {
        let dir = dir.as_ref();
        let mut faces = Vec::with_capacity(6);
        for file in Self::FACE_FILES {
            faces.push(Texture::from_file(dir.join(file))?);
        }
        let faces: [Texture; 6] = faces
            .try_into()
            .map_err(|_| RenderError::InvalidTexture {
                name: dir.display().to_string(),
                message: "expected six cubemap faces".to_string(),
            })?;
        Ok(Self::new(faces, subdivisions))
    }

    /// Procedural sky: horizon to zenith gradient, dark ground below
    pub fn gradient(subdivisions: usize) -> Self {
        const SIZE: usize = 64;
        let zenith = Vec3::new(0.15, 0.35, 0.75);
        let horizon = Vec3::new(0.75, 0.85, 0.95);
        let ground = Vec3::new(0.25, 0.22, 0.2);

        let faces = CubeFace::ALL.map(|face| {
            let mut pixels = Vec::with_capacity(SIZE * SIZE);
            for y in 0..SIZE {
                for x in 0..SIZE {
                    let st = Vec2::new((x as f32 + 0.5) / SIZE as f32, (y as f32 + 0.5) / SIZE as f32);
                    let up = face.direction(st).normalize().y;
                    let c = if up >= 0.0 {
                        horizon.lerp(zenith, up.sqrt())
                    } else {
                        horizon.lerp(ground, (-up * 4.0).min(1.0))
                    };
                    let c = (c * 255.0).round();
                    pixels.push(Color::new(c.x as u8, c.y as u8, c.z as u8));
                }
            }
            Texture {
                width: SIZE,
                height: SIZE,
                pixels,
                name: format!("sky_{:?}", face),
            }
        });

        Self::new(faces, subdivisions)
    }
}
