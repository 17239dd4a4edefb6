//! Scene description: geometry, camera, materials and sky
//!
//! These are the inputs a frame is rendered from. The renderer only ever
//! borrows them.

mod camera;
mod material;
mod mesh;

pub use camera::*;
pub use material::*;
pub use mesh::*;

/// Everything drawn in one frame
pub struct Scene {
    pub mesh: Mesh,
    pub material: Material,
    pub camera: Camera,
    pub skybox: Option<Skybox>,
}

impl Scene {
    pub fn new(mesh: Mesh, material: Material, camera: Camera) -> Self {
        Self {
            mesh,
            material,
            camera,
            skybox: None,
        }
    }

    pub fn with_skybox(mut self, skybox: Skybox) -> Self {
        self.skybox = Some(skybox);
        self
    }
}
