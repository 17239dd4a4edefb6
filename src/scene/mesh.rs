//! Triangle meshes
//!
//! Front faces wind clockwise as seen from the side they face, which is
//! the winding the rasterizer fills.

use glam::{Vec2, Vec3, Vec4};

use crate::error::RenderError;
use crate::shading::CubeFace;

/// A vertex with position, texture coordinate, and normal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    /// World-space position, w = 1
    pub position: Vec4,
    pub uv: Vec2,
    /// Unit normal, w = 0
    pub normal: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position: position.extend(1.0),
            uv,
            normal: normal.extend(0.0),
        }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Build a mesh, checking that every index is in range.
    /// A trailing partial triangle is ignored.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, RenderError> {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(RenderError::MeshIndex {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Build from flat attribute arrays as a model loader hands them over
    pub fn from_arrays(
        positions: &[Vec3],
        uvs: &[Vec2],
        normals: &[Vec3],
        indices: Vec<u32>,
    ) -> Result<Self, RenderError> {
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                Vertex::new(
                    p,
                    uvs.get(i).copied().unwrap_or_default(),
                    normals.get(i).copied().unwrap_or(Vec3::Y).normalize_or_zero(),
                )
            })
            .collect();
        Self::new(vertices, indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |t| {
            [
                &self.vertices[t[0] as usize],
                &self.vertices[t[1] as usize],
                &self.vertices[t[2] as usize],
            ]
        })
    }

    /// Unit cube centered on the origin, 2x2x2, faces pointing outward
    pub fn cube() -> Self {
        let mut mesh = Mesh::default();
        for face in CubeFace::ALL {
            let (u, v) = face.axes();
            mesh.push_grid(face.normal(), u, v, 1, Winding::Outward, |_, uv| uv);
        }
        mesh
    }

    /// Cube of the given subdivision seen from inside, with per-face
    /// texcoords matching the cubemap projection of each face
    pub fn skybox_cube(subdivisions: usize) -> Self {
        let mut mesh = Mesh::default();
        for face in CubeFace::ALL {
            let (u, v) = face.axes();
            mesh.push_grid(face.normal(), u, v, subdivisions.max(1), Winding::Inward, |p, _| face.coords(p));
        }
        mesh
    }

    /// Unit sphere. Pole rows produce zero-area triangles, which the
    /// rasterizer skips.
    pub fn uv_sphere(segments: usize, rings: usize) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity((segments + 1) * (rings + 1));
        let mut indices = Vec::with_capacity(segments * rings * 6);

        for j in 0..=rings {
            let phi = std::f32::consts::PI * j as f32 / rings as f32;
            for i in 0..=segments {
                let theta = std::f32::consts::TAU * i as f32 / segments as f32;
                let p = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                let uv = Vec2::new(i as f32 / segments as f32, j as f32 / rings as f32);
                vertices.push(Vertex::new(p, uv, p));
            }
        }

        let row = segments as u32 + 1;
        for j in 0..rings as u32 {
            for i in 0..segments as u32 {
                let a = j * row + i;
                let b = a + 1;
                let d = a + row;
                let c = d + 1;
                indices.extend_from_slice(&[a, c, b, a, d, c]);
            }
        }

        Self { vertices, indices }
    }

    /// Subdivided square on the plane through `n`, spanned by `u` and `v`
    /// with `u x v = n`.
    fn push_grid(
        &mut self,
        n: Vec3,
        u: Vec3,
        v: Vec3,
        subdivisions: usize,
        winding: Winding,
        texcoord: impl Fn(Vec3, Vec2) -> Vec2,
    ) {
        let base = self.vertices.len() as u32;
        let steps = subdivisions as f32;
        let normal = match winding {
            Winding::Outward => n,
            Winding::Inward => -n,
        };

        for j in 0..=subdivisions {
            for i in 0..=subdivisions {
                let fu = i as f32 / steps;
                let fv = j as f32 / steps;
                let p = n + u * (fu * 2.0 - 1.0) + v * (fv * 2.0 - 1.0);
                // t runs down the face
                let uv = Vec2::new(fu, 1.0 - fv);
                self.vertices.push(Vertex::new(p, texcoord(p, uv), normal));
            }
        }

        let row = subdivisions as u32 + 1;
        for j in 0..subdivisions as u32 {
            for i in 0..subdivisions as u32 {
                let p00 = base + j * row + i;
                let p10 = p00 + 1;
                let p01 = p00 + row;
                let p11 = p01 + 1;
                match winding {
                    // clockwise seen from outside
                    Winding::Outward => self.indices.extend_from_slice(&[p00, p11, p10, p00, p01, p11]),
                    // clockwise seen from inside
                    Winding::Inward => self.indices.extend_from_slice(&[p00, p10, p11, p00, p11, p01]),
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Winding {
    Outward,
    Inward,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Geometric normal of a triangle with this crate's clockwise winding
    fn front_normal(t: [&Vertex; 3]) -> Vec3 {
        let a = t[0].position.truncate();
        let b = t[1].position.truncate();
        let c = t[2].position.truncate();
        // clockwise front: (c - a) x (b - a) points to the front side
        (c - a).cross(b - a)
    }

    #[test]
    fn test_index_validation() {
        let v = vec![Vertex::default(); 3];
        assert!(Mesh::new(v.clone(), vec![0, 1, 2]).is_ok());
        assert!(matches!(
            Mesh::new(v, vec![0, 1, 3]),
            Err(RenderError::MeshIndex { index: 3, vertex_count: 3 })
        ));
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = Mesh::cube();
        assert_eq!(cube.triangle_count(), 12);
        for t in cube.triangles() {
            let n = front_normal(t);
            let center = (t[0].position + t[1].position + t[2].position).truncate() / 3.0;
            assert!(n.dot(center) > 0.0);
            assert!(n.normalize().dot(t[0].normal.truncate()) > 0.99);
        }
    }

    #[test]
    fn test_skybox_faces_point_inward() {
        let sky = Mesh::skybox_cube(4);
        assert_eq!(sky.triangle_count(), 6 * 4 * 4 * 2);
        for t in sky.triangles() {
            let center = (t[0].position + t[1].position + t[2].position).truncate() / 3.0;
            assert!(front_normal(t).dot(center) < 0.0);
            for v in t {
                assert!((0.0..=1.0).contains(&v.uv.x) && (0.0..=1.0).contains(&v.uv.y));
            }
        }
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let sphere = Mesh::uv_sphere(16, 8);
        for t in sphere.triangles() {
            let n = front_normal(t);
            if n.length() < 1e-6 {
                continue; // pole
            }
            let center = (t[0].position + t[1].position + t[2].position).truncate() / 3.0;
            assert!(n.dot(center) > 0.0);
        }
        for v in &sphere.vertices {
            assert!((v.position.truncate().length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_from_arrays() {
        let mesh = Mesh::from_arrays(
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[Vec2::ZERO],
            &[],
            vec![0, 1, 2],
        )
        .unwrap();
        assert_eq!(mesh.vertices[0].position.w, 1.0);
        assert_eq!(mesh.vertices[2].uv, Vec2::ZERO);
        assert_eq!(mesh.vertices[1].normal, Vec4::new(0.0, 1.0, 0.0, 0.0));
    }
}
