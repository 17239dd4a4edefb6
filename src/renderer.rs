//! Frame orchestration
//!
//! Each pass projects its mesh on the calling thread, builds one job per
//! triangle (screen vertices plus an immutable shader) and hands the whole
//! list to the pixel scheduler. A pass returns only after every band is
//! filled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use glam::{Mat3, Mat4, Vec3};

use crate::config::RenderSettings;
use crate::error::RenderError;
use crate::rasterizer::{
    depth_in_range, draw_triangle_edges, rasterize_triangle, Color, DepthBuffer, DepthInterpolation,
    FragmentShader, Framebuffer, PixelScheduler, ScreenVertex,
};
use crate::scene::{Camera, Material, Mesh, Scene, Skybox, Vertex};
use crate::shading::{SkyboxShader, SurfaceShader, VertexStage};

/// Interpolation used by every shaded pass
const INTERPOLATION: DepthInterpolation = DepthInterpolation::PerspectiveCorrect;

/// Skybox half-extent as a fraction of the far plane. Keeps the corners
/// (at sqrt(3) times the half-extent) inside the far plane.
const SKYBOX_SCALE: f32 = 0.5;

/// Counters for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Triangles handed to the workers
    pub submitted: usize,
    /// Triangles dropped by the near/far reject
    pub rejected: usize,
    /// Pixels written
    pub pixels: usize,
}

impl std::ops::AddAssign for PassStats {
    fn add_assign(&mut self, other: Self) {
        self.submitted += other.submitted;
        self.rejected += other.rejected;
        self.pixels += other.pixels;
    }
}

/// Counters for a whole frame
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub submitted: usize,
    pub rejected: usize,
    pub pixels: usize,
    pub elapsed: Duration,
}

struct Job<S> {
    vertices: [ScreenVertex; 3],
    shader: S,
}

pub struct Renderer {
    settings: RenderSettings,
    color: Framebuffer,
    depth: DepthBuffer,
    scheduler: PixelScheduler,
}

impl Renderer {
    /// Allocate the render targets and start the worker pool
    pub fn new(settings: RenderSettings) -> Result<Self, RenderError> {
        let color = Framebuffer::new(settings.width, settings.height)?;
        let depth = DepthBuffer::new(settings.width, settings.height)?;
        let scheduler = PixelScheduler::new(settings.workers)?;
        log::info!(
            "Renderer {}x{} with {} workers",
            settings.width,
            settings.height,
            scheduler.workers()
        );
        Ok(Self {
            settings,
            color,
            depth,
            scheduler,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Runtime-adjustable settings. Viewport size and worker count are
    /// fixed at creation; changing them here has no effect.
    pub fn settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.settings
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.color
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn workers(&self) -> usize {
        self.scheduler.workers()
    }

    /// Clear color to the clear color and depth to the far sentinel
    pub fn begin_frame(&mut self) {
        let (r, g, b) = self.settings.clear_color;
        self.color.clear(Color::new(r, g, b).to_u32());
        self.depth.clear();
    }

    /// Draw the sky cube around the camera. Sampling is nearest whatever
    /// the texture filter is.
    pub fn draw_skybox(&mut self, camera: &Camera, skybox: &Skybox) -> Result<PassStats, RenderError> {
        let settings = &self.settings.skybox;
        let model = Mat4::from_scale(Vec3::splat(camera.far * SKYBOX_SCALE));
        let stage = VertexStage::skybox(
            camera,
            model,
            settings.strip_translation,
            self.color.width,
            self.color.height,
        );
        let sampling = settings.sampling;

        let (jobs, rejected) = build_jobs(&stage, &skybox.mesh, |t| SkyboxShader {
            faces: &skybox.faces,
            sampling,
            positions: t.map(|v| v.position.truncate()),
            texcoords: t.map(|v| v.uv),
        });
        let stats = self.dispatch(&jobs, rejected)?;
        log::debug!(
            "skybox pass: {} triangles, {} rejected, {} pixels",
            stats.submitted,
            stats.rejected,
            stats.pixels
        );
        Ok(stats)
    }

    /// Draw a PBR-shaded mesh. Fails without drawing if the material is
    /// missing a texture.
    pub fn draw_mesh(
        &mut self,
        camera: &Camera,
        mesh: &Mesh,
        material: &Material,
        model: Mat4,
    ) -> Result<PassStats, RenderError> {
        let textures = material.textures()?;
        let stage = VertexStage::surface(camera, model, self.color.width, self.color.height);
        let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
        let filter = self.settings.texture_filter;
        let camera_position = camera.position();

        let (jobs, rejected) = build_jobs(&stage, mesh, |t| SurfaceShader {
            textures,
            filter,
            camera_position,
            positions: t.map(|v| model.transform_point3(v.position.truncate())),
            texcoords: t.map(|v| v.uv),
            normals: t.map(|v| (normal_matrix * v.normal.truncate()).normalize_or_zero()),
        });
        let stats = self.dispatch(&jobs, rejected)?;
        log::debug!(
            "surface pass: {} triangles, {} rejected, {} pixels",
            stats.submitted,
            stats.rejected,
            stats.pixels
        );
        Ok(stats)
    }

    /// Overlay triangle edges. Lines ignore and leave the depth buffer.
    pub fn draw_wireframe(&mut self, camera: &Camera, mesh: &Mesh, model: Mat4) -> Result<PassStats, RenderError> {
        let (r, g, b) = self.settings.wireframe.color;
        let color = Color::new(r, g, b).to_u32();
        let stage = VertexStage::surface(camera, model, self.color.width, self.color.height);

        let mut rejected = 0;
        let triangles: Vec<[ScreenVertex; 3]> = mesh
            .triangles()
            .map(|t| t.map(|v| stage.project(v.position)))
            .filter(|v| {
                let keep = depth_in_range(v);
                rejected += usize::from(!keep);
                keep
            })
            .collect();

        let written = AtomicUsize::new(0);
        self.scheduler.run(&mut self.color, &mut self.depth, |band| {
            let n: usize = triangles.iter().map(|v| draw_triangle_edges(band, v, color)).sum();
            written.fetch_add(n, Ordering::Relaxed);
        })?;

        Ok(PassStats {
            submitted: triangles.len(),
            rejected,
            pixels: written.into_inner(),
        })
    }

    /// Whole frame: clear, skybox, surface, then the optional wireframe
    pub fn render_scene(&mut self, scene: &Scene) -> Result<FrameStats, RenderError> {
        let start = Instant::now();
        let mut total = PassStats::default();

        self.begin_frame();
        if self.settings.skybox.enabled {
            if let Some(skybox) = &scene.skybox {
                total += self.draw_skybox(&scene.camera, skybox)?;
            }
        }
        total += self.draw_mesh(&scene.camera, &scene.mesh, &scene.material, Mat4::IDENTITY)?;
        if self.settings.wireframe.enabled {
            total += self.draw_wireframe(&scene.camera, &scene.mesh, Mat4::IDENTITY)?;
        }

        let elapsed = start.elapsed();
        log::trace!("frame in {:.2} ms", elapsed.as_secs_f64() * 1000.0);
        Ok(FrameStats {
            submitted: total.submitted,
            rejected: total.rejected,
            pixels: total.pixels,
            elapsed,
        })
    }

    fn dispatch<S: FragmentShader>(&mut self, jobs: &[Job<S>], rejected: usize) -> Result<PassStats, RenderError> {
        let written = AtomicUsize::new(0);
        self.scheduler.run(&mut self.color, &mut self.depth, |band| {
            let mut n = 0;
            for job in jobs {
                n += rasterize_triangle(band, &job.vertices, INTERPOLATION, &job.shader);
            }
            written.fetch_add(n, Ordering::Relaxed);
        })?;
        Ok(PassStats {
            submitted: jobs.len(),
            rejected,
            pixels: written.into_inner(),
        })
    }
}

/// Project every triangle of `mesh` and pair the survivors of the near/far
/// reject with their shader
fn build_jobs<'m, S>(
    stage: &VertexStage,
    mesh: &'m Mesh,
    mut shader: impl FnMut([&'m Vertex; 3]) -> S,
) -> (Vec<Job<S>>, usize) {
    let mut jobs = Vec::with_capacity(mesh.triangle_count());
    let mut rejected = 0;
    for t in mesh.triangles() {
        let vertices = t.map(|v| stage.project(v.position));
        if depth_in_range(&vertices) {
            jobs.push(Job {
                vertices,
                shader: shader(t),
            });
        } else {
            rejected += 1;
        }
    }
    (jobs, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{unpack_rgb, Texture};

    fn settings(workers: usize) -> RenderSettings {
        RenderSettings {
            width: 64,
            height: 48,
            workers,
            ..RenderSettings::default()
        }
    }

    fn scene() -> Scene {
        let camera = Camera::new(64.0 / 48.0);
        Scene::new(Mesh::uv_sphere(24, 12), Material::procedural(), camera)
    }

    #[test]
    fn test_sphere_covers_center() {
        let mut renderer = Renderer::new(settings(2)).unwrap();
        let stats = renderer.render_scene(&scene()).unwrap();
        assert!(stats.pixels > 0);
        assert_eq!(stats.rejected, 0);

        let clear = Color::new(20, 20, 28).to_u32();
        let center = renderer.framebuffer().get(32, 24).unwrap();
        assert_ne!(center, clear);
        // corners stay background
        assert_eq!(renderer.framebuffer().get(0, 0), Some(clear));
        assert!(renderer.depth_buffer().get(32, 24).unwrap() > 0.0);
    }

    #[test]
    fn test_missing_texture_rejects_draw() {
        let mut renderer = Renderer::new(settings(2)).unwrap();
        let mut scene = scene();
        scene.material.normal = None;
        renderer.begin_frame();
        let before = renderer.framebuffer().pixels().to_vec();
        assert!(matches!(
            renderer.draw_mesh(&scene.camera, &scene.mesh, &scene.material, Mat4::IDENTITY),
            Err(RenderError::MissingTexture("normal"))
        ));
        assert_eq!(renderer.framebuffer().pixels(), &before[..]);
    }

    #[test]
    fn test_worker_count_does_not_change_image() {
        let scene = scene().with_skybox(Skybox::gradient(4));
        let mut single = Renderer::new(settings(1)).unwrap();
        let mut many = Renderer::new(settings(5)).unwrap();
        single.render_scene(&scene).unwrap();
        many.render_scene(&scene).unwrap();
        assert_eq!(single.framebuffer().pixels(), many.framebuffer().pixels());
    }

    #[test]
    fn test_skybox_fills_background() {
        let mut renderer = Renderer::new(settings(3)).unwrap();
        let scene = scene().with_skybox(Skybox::gradient(8));
        let stats = renderer.render_scene(&scene).unwrap();
        assert!(stats.elapsed > Duration::ZERO);
        let clear = Color::new(20, 20, 28).to_u32();
        assert_eq!(renderer.framebuffer().count(clear), 0);
        // sky pixels are opaque
        assert!(renderer.framebuffer().pixels().iter().all(|p| p & 0xFF == 0xFF));
    }

    #[test]
    fn test_wireframe_draws_over_surface() {
        let mut renderer = Renderer::new(settings(2)).unwrap();
        renderer.settings_mut().wireframe.enabled = true;
        renderer.settings_mut().wireframe.color = (255, 0, 255);
        let scene = Scene::new(Mesh::cube(), Material::procedural(), Camera::new(64.0 / 48.0));
        let stats = renderer.render_scene(&scene).unwrap();
        assert!(stats.submitted >= 24);
        assert!(renderer.framebuffer().count(Color::new(255, 0, 255).to_u32()) > 0);
    }

    #[test]
    fn test_camera_inside_mesh_rejected_not_fatal() {
        let mut renderer = Renderer::new(settings(2)).unwrap();
        let mut scene = scene();
        scene.camera.distance = 0.2;
        scene.camera.near = 0.1;
        let stats = renderer.render_scene(&scene).unwrap();
        assert!(stats.rejected > 0);
    }

    #[test]
    fn test_lit_side_brighter() {
        let mut renderer = Renderer::new(settings(2)).unwrap();
        let mut scene = scene();
        scene.material.albedo = Some(Texture::solid(Color::new(180, 180, 180), "gray"));
        // light comes from +x +y +z; look down -z with yaw 0
        scene.camera.pitch = 0.0;
        renderer.render_scene(&scene).unwrap();
        let fb = renderer.framebuffer();
        let lum = |x, y| unpack_rgb(fb.get(x, y).unwrap()).element_sum();
        assert!(lum(36, 20) > lum(28, 28));
    }
}
