//! Cubemap skybox shading

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::rasterizer::{FragmentShader, Texture, Weights};

/// One face of a cubemap, in face-array order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Outward axis of the face
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Right and up axes of the face seen from outside, `u x v = normal`
    pub fn axes(self) -> (Vec3, Vec3) {
        match self {
            CubeFace::PositiveX => (Vec3::NEG_Z, Vec3::Y),
            CubeFace::NegativeX => (Vec3::Z, Vec3::Y),
            CubeFace::PositiveY => (Vec3::X, Vec3::NEG_Z),
            CubeFace::NegativeY => (Vec3::X, Vec3::Z),
            CubeFace::PositiveZ => (Vec3::X, Vec3::Y),
            CubeFace::NegativeZ => (Vec3::NEG_X, Vec3::Y),
        }
    }

    /// Point on the face for texture coordinate `st`; inverse of `coords`
    pub fn direction(self, st: Vec2) -> Vec3 {
        let (u, v) = self.axes();
        self.normal() + u * (st.x * 2.0 - 1.0) + v * (1.0 - st.y * 2.0)
    }

    /// Face a direction points into, by its dominant axis.
    /// Ties between axes fall through to Z, then Y.
    pub fn from_direction(dir: Vec3) -> Self {
        let a = dir.abs();
        if a.x > a.y && a.x > a.z {
            if dir.x < 0.0 { CubeFace::NegativeX } else { CubeFace::PositiveX }
        } else if a.y > a.x && a.y > a.z {
            if dir.y < 0.0 { CubeFace::NegativeY } else { CubeFace::PositiveY }
        } else if dir.z < 0.0 {
            CubeFace::NegativeZ
        } else {
            CubeFace::PositiveZ
        }
    }

    /// Project `dir` onto this face, giving (s, t) in [0,1]^2 with t down
    pub fn coords(self, dir: Vec3) -> Vec2 {
        let (sc, tc, ma) = match self {
            CubeFace::PositiveX => (-dir.z, -dir.y, dir.x),
            CubeFace::NegativeX => (dir.z, -dir.y, dir.x),
            CubeFace::PositiveY => (dir.x, dir.z, dir.y),
            CubeFace::NegativeY => (dir.x, -dir.z, dir.y),
            CubeFace::PositiveZ => (dir.x, -dir.y, dir.z),
            CubeFace::NegativeZ => (-dir.x, -dir.y, dir.z),
        };
        let ma = ma.abs().max(f32::MIN_POSITIVE);
        Vec2::new(0.5 * (sc / ma + 1.0), 0.5 * (tc / ma + 1.0))
    }
}

/// Face selection and projection in one step
pub fn cube_lookup(dir: Vec3) -> (CubeFace, Vec2) {
    let face = CubeFace::from_direction(dir);
    (face, face.coords(dir))
}

/// Where skybox texture coordinates come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SkyboxSampling {
    /// Project the interpolated direction onto its dominant face
    #[default]
    Direction,
    /// Dominant face from the direction, coordinates from the
    /// interpolated per-vertex texcoords
    FaceTexcoords,
}

impl SkyboxSampling {
    pub fn toggled(self) -> Self {
        match self {
            SkyboxSampling::Direction => SkyboxSampling::FaceTexcoords,
            SkyboxSampling::FaceTexcoords => SkyboxSampling::Direction,
        }
    }
}

/// Per-triangle inputs of the skybox shader.
///
/// Always samples nearest, whatever the global filter is.
#[derive(Clone, Copy)]
pub struct SkyboxShader<'a> {
    /// Indexed by `CubeFace::index`
    pub faces: &'a [Texture; 6],
    pub sampling: SkyboxSampling,
    /// Unscaled cube-space vertex positions
    pub positions: [Vec3; 3],
    pub texcoords: [Vec2; 3],
}

impl FragmentShader for SkyboxShader<'_> {
    fn shade(&self, w: &Weights) -> u32 {
        let dir = w.blend3(self.positions);
        let face = CubeFace::from_direction(dir);
        let st = match self.sampling {
            SkyboxSampling::Direction => face.coords(dir),
            SkyboxSampling::FaceTexcoords => Vec2::new(
                w.scalar([self.texcoords[0].x, self.texcoords[1].x, self.texcoords[2].x]),
                w.scalar([self.texcoords[0].y, self.texcoords[1].y, self.texcoords[2].y]),
            ),
        };
        let texture = &self.faces[face.index()];
        let c = texture.get_pixel(
            ((st.x.clamp(0.0, 1.0) * texture.width as f32) as usize).min(texture.width - 1),
            ((st.y.clamp(0.0, 1.0) * texture.height as f32) as usize).min(texture.height - 1),
        );
        c.to_u32() | 0xFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Color;

    #[test]
    fn test_dominant_axis_selection() {
        assert_eq!(CubeFace::from_direction(Vec3::new(0.1, 0.9, 0.2)), CubeFace::PositiveY);
        assert_eq!(CubeFace::from_direction(Vec3::new(-0.9, 0.1, 0.1)), CubeFace::NegativeX);
        assert_eq!(CubeFace::from_direction(Vec3::new(0.3, -0.2, -0.8)), CubeFace::NegativeZ);
        assert_eq!(CubeFace::from_direction(Vec3::new(0.0, -2.0, 1.0)), CubeFace::NegativeY);
        // Tie on x/z goes to z
        assert_eq!(CubeFace::from_direction(Vec3::new(1.0, 0.0, 1.0)), CubeFace::PositiveZ);
    }

    #[test]
    fn test_face_axes_right_handed() {
        for face in CubeFace::ALL {
            let (u, v) = face.axes();
            assert_eq!(u.cross(v), face.normal());
        }
    }

    #[test]
    fn test_direction_inverts_coords() {
        for face in CubeFace::ALL {
            for st in [Vec2::new(0.1, 0.2), Vec2::new(0.5, 0.5), Vec2::new(0.9, 0.7)] {
                let dir = face.direction(st);
                assert_eq!(CubeFace::from_direction(dir), face);
                assert!((face.coords(dir) - st).abs().max_element() < 1e-5);
            }
        }
    }

    #[test]
    fn test_face_center_maps_to_middle() {
        for face in CubeFace::ALL {
            let st = face.coords(face.normal() * 3.0);
            assert!((st - Vec2::splat(0.5)).abs().max_element() < 1e-6, "{:?}", face);
        }
    }

    #[test]
    fn test_coords_in_unit_square() {
        let dirs = [
            Vec3::new(0.1, 0.9, 0.2),
            Vec3::new(-0.9, 0.1, 0.1),
            Vec3::new(0.5, -0.5, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        ];
        for d in dirs {
            let (_, st) = cube_lookup(d);
            assert!((0.0..=1.0).contains(&st.x) && (0.0..=1.0).contains(&st.y));
        }
        let (face, st) = cube_lookup(Vec3::new(0.5, -0.5, 1.0));
        assert_eq!(face, CubeFace::PositiveZ);
        assert!((st - Vec2::new(0.75, 0.75)).abs().max_element() < 1e-6);
    }

    fn faces() -> [Texture; 6] {
        let colors = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE, Color::BLACK, Color::new(9, 9, 9)];
        colors.map(|c| Texture::solid(c, "face"))
    }

    #[test]
    fn test_shader_samples_dominant_face() {
        let faces = faces();
        let shader = SkyboxShader {
            faces: &faces,
            sampling: SkyboxSampling::Direction,
            positions: [Vec3::new(-1.0, 0.2, 0.1), Vec3::new(-1.0, -0.2, 0.1), Vec3::new(-1.0, 0.0, -0.2)],
            texcoords: [Vec2::ZERO; 3],
        };
        assert_eq!(shader.shade(&Weights::linear(0.3, 0.3, 0.4)), Color::GREEN.to_u32());

        let mut by_texcoords = shader;
        by_texcoords.sampling = SkyboxSampling::FaceTexcoords;
        assert_eq!(by_texcoords.shade(&Weights::linear(0.3, 0.3, 0.4)), Color::GREEN.to_u32());
    }

    #[test]
    fn test_face_texcoords_strategy_uses_vertex_uvs() {
        let left = Texture::from_pixels(2, 1, vec![Color::RED, Color::BLUE], "split").unwrap();
        let faces = [left.clone(), left.clone(), left.clone(), left.clone(), left.clone(), left];
        let positions = [Vec3::new(-0.2, 0.2, 1.0), Vec3::new(0.2, 0.2, 1.0), Vec3::new(0.0, -0.2, 1.0)];
        let shader = SkyboxShader {
            faces: &faces,
            sampling: SkyboxSampling::FaceTexcoords,
            positions,
            // deliberately all on the right half
            texcoords: [Vec2::new(0.9, 0.5); 3],
        };
        let w = Weights::linear(0.6, 0.2, 0.2);
        assert_eq!(shader.shade(&w), Color::BLUE.to_u32());

        let mut geometric = shader;
        geometric.sampling = SkyboxSampling::Direction;
        // direction x = -0.08 lands on the left texel
        assert_eq!(geometric.shade(&w), Color::RED.to_u32());
    }
}
