//! pbr-raster viewer
//!
//! Renders a PBR-shaded mesh inside a skybox on the CPU and shows each
//! frame in a window.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use macroquad::prelude::*;

use pbr_raster::rasterizer::{HEIGHT, WIDTH};
use pbr_raster::scene::{Material, Mesh, Scene, Skybox};
use pbr_raster::{RenderSettings, Renderer, VERSION};

/// Orbit speed in radians per second
const ORBIT_SPEED: f32 = 1.5;
/// Zoom speed in world units per second
const ZOOM_SPEED: f32 = 3.0;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MeshKind {
    Cube,
    Sphere,
}

#[derive(Parser)]
#[command(name = "pbr-raster")]
#[command(about = "CPU rasterizer with PBR shading and a cubemap skybox", long_about = None)]
#[command(version)]
struct Cli {
    /// Render settings file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pixel worker threads, overrides the settings file
    #[arg(short, long)]
    workers: Option<usize>,

    /// Mesh to render
    #[arg(long, value_enum, default_value = "sphere")]
    mesh: MeshKind,

    /// Directory with albedo.png, metallic_roughness.png and normal.png
    #[arg(long)]
    textures: Option<PathBuf>,

    /// Directory with right/left/top/bottom/front/back.png
    #[arg(long)]
    skybox: Option<PathBuf>,

    /// Save the first rendered frame as PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("pbr-raster v{}", VERSION),
        window_width: WIDTH as i32,
        window_height: HEIGHT as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Window size for a framebuffer: the largest whole-pixel scale that fits
/// the default window, never below 1
fn window_size(settings: &RenderSettings) -> (f32, f32) {
    let (w, h) = (settings.width as f32, settings.height as f32);
    let scale = (WIDTH as f32 / w).min(HEIGHT as f32 / h).floor().max(1.0);
    (w * scale, h * scale)
}

fn fail(message: impl std::fmt::Display) -> ! {
    log::error!("{}", message);
    process::exit(1);
}

fn load_scene(cli: &Cli, settings: &RenderSettings) -> Result<Scene, pbr_raster::RenderError> {
    let mesh = match cli.mesh {
        MeshKind::Cube => Mesh::cube(),
        MeshKind::Sphere => Mesh::uv_sphere(48, 24),
    };
    let material = match &cli.textures {
        Some(dir) => Material::from_directory(dir),
        None => Material::procedural(),
    };
    // Reject an incomplete material up front rather than on the first frame
    material.textures()?;

    let subdivisions = settings.skybox.subdivisions;
    let skybox = match &cli.skybox {
        Some(dir) => Skybox::from_directory(dir, subdivisions)?,
        None => Skybox::gradient(subdivisions),
    };

    Ok(Scene::new(mesh, material, settings.camera()).with_skybox(skybox))
}

fn save_snapshot(renderer: &Renderer, path: &Path) -> Result<(), image::ImageError> {
    let fb = renderer.framebuffer();
    image::save_buffer(
        path,
        &fb.to_rgba8(),
        fb.width as u32,
        fb.height as u32,
        image::ExtendedColorType::Rgba8,
    )
}

/// Apply keyboard input for this frame
fn handle_input(scene: &mut Scene, renderer: &mut Renderer, dt: f32) {
    let camera = &mut scene.camera;
    if is_key_down(KeyCode::Left) {
        camera.orbit(-ORBIT_SPEED * dt, 0.0);
    }
    if is_key_down(KeyCode::Right) {
        camera.orbit(ORBIT_SPEED * dt, 0.0);
    }
    if is_key_down(KeyCode::Up) {
        camera.orbit(0.0, ORBIT_SPEED * dt);
    }
    if is_key_down(KeyCode::Down) {
        camera.orbit(0.0, -ORBIT_SPEED * dt);
    }
    if is_key_down(KeyCode::Equal) || is_key_down(KeyCode::KpAdd) {
        camera.zoom(-ZOOM_SPEED * dt);
    }
    if is_key_down(KeyCode::Minus) || is_key_down(KeyCode::KpSubtract) {
        camera.zoom(ZOOM_SPEED * dt);
    }

    let settings = renderer.settings_mut();
    if is_key_pressed(KeyCode::W) {
        settings.wireframe.enabled = !settings.wireframe.enabled;
        log::info!("Wireframe: {}", settings.wireframe.enabled);
    }
    if is_key_pressed(KeyCode::F) {
        settings.texture_filter = settings.texture_filter.toggled();
        log::info!("Texture filter: {:?}", settings.texture_filter);
    }
    if is_key_pressed(KeyCode::S) {
        settings.skybox.sampling = settings.skybox.sampling.toggled();
        log::info!("Skybox sampling: {:?}", settings.skybox.sampling);
    }
    if is_key_pressed(KeyCode::T) {
        settings.skybox.strip_translation = !settings.skybox.strip_translation;
        log::info!("Skybox translation stripping: {}", settings.skybox.strip_translation);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut settings = match &cli.config {
        Some(path) => RenderSettings::load(path).unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e))),
        None => RenderSettings::default(),
    };
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }
    if let Err(e) = settings.validate() {
        fail(e);
    }

    let mut scene = load_scene(&cli, &settings).unwrap_or_else(|e| fail(e));
    let (window_w, window_h) = window_size(&settings);
    request_new_screen_size(window_w, window_h);
    let mut renderer = Renderer::new(settings).unwrap_or_else(|e| fail(e));
    let mut snapshot = cli.snapshot.clone();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        handle_input(&mut scene, &mut renderer, get_frame_time());

        let stats = renderer.render_scene(&scene).unwrap_or_else(|e| fail(e));

        if let Some(path) = snapshot.take() {
            match save_snapshot(&renderer, &path) {
                Ok(()) => log::info!("Saved snapshot to {}", path.display()),
                Err(e) => log::error!("Failed to save snapshot {}: {}", path.display(), e),
            }
        }

        clear_background(Color::from_rgba(0, 0, 0, 255));

        // Convert framebuffer to texture, letterboxed to the window
        let fb = renderer.framebuffer();
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.to_rgba8());
        texture.set_filter(FilterMode::Nearest);

        let scale = (screen_width() / fb.width as f32).min(screen_height() / fb.height as f32);
        let draw_w = fb.width as f32 * scale;
        let draw_h = fb.height as f32 * scale;
        draw_texture_ex(
            &texture,
            (screen_width() - draw_w) * 0.5,
            (screen_height() - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        draw_text(
            &format!(
                "{} tris | {} rejected | {:.1} ms",
                stats.submitted,
                stats.rejected,
                stats.elapsed.as_secs_f64() * 1000.0
            ),
            8.0,
            20.0,
            18.0,
            Color::from_rgba(220, 220, 220, 255),
        );

        next_frame().await;
    }
}
