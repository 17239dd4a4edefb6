//! Core types for the rasterizer

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to u32 (RGBA8888, the framebuffer pixel format)
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | (self.a as u32)
    }

    pub fn from_u32(p: u32) -> Self {
        let [r, g, b, a] = p.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Channels as floats in [0,1] (alpha dropped)
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Weighted average of the four nearest texels
    #[default]
    Bilinear,
}

impl FilterMode {
    pub fn toggled(self) -> Self {
        match self {
            FilterMode::Nearest => FilterMode::Bilinear,
            FilterMode::Bilinear => FilterMode::Nearest,
        }
    }
}

/// Sampleable image, row-major with (0,0) at the top-left texel
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
    pub name: String,
}

impl Texture {
    /// Blank white texture
    pub fn new(width: usize, height: usize, name: impl Into<String>) -> Result<Self, RenderError> {
        let name = name.into();
        let texels = match width.checked_mul(height) {
            Some(texels) if texels > 0 => texels,
            _ => {
                return Err(RenderError::InvalidTexture {
                    name,
                    message: format!("unusable size {}x{}", width, height),
                })
            }
        };
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(texels)
            .map_err(|_| RenderError::InvalidTexture {
                name: name.clone(),
                message: format!("cannot allocate {} texels", texels),
            })?;
        pixels.resize(texels, Color::WHITE);
        Self::from_pixels(width, height, pixels, name)
    }

    /// Wrap decoded pixels, checking the layout
    pub fn from_pixels(
        width: usize,
        height: usize,
        pixels: Vec<Color>,
        name: impl Into<String>,
    ) -> Result<Self, RenderError> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTexture {
                name,
                message: format!("zero-sized image {}x{}", width, height),
            });
        }
        if width.checked_mul(height) != Some(pixels.len()) {
            return Err(RenderError::InvalidTexture {
                name,
                message: format!("expected {}x{} pixels, got {}", width, height, pixels.len()),
            });
        }
        Ok(Self { width, height, pixels, name })
    }

    /// Load texture from an image file (PNG, JPEG or BMP)
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let img = image::open(path).map_err(|e| RenderError::InvalidTexture {
            name: path.display().to_string(),
            message: e.to_string(),
        })?;

        let tex = Self::from_image(img, name)?;
        log::info!("Loaded texture: {} ({}x{})", tex.name, tex.width, tex.height);
        Ok(tex)
    }

    /// Load texture from raw encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self, RenderError> {
        let name = name.into();
        let img = image::load_from_memory(bytes).map_err(|e| RenderError::InvalidTexture {
            name: name.clone(),
            message: e.to_string(),
        })?;
        Self::from_image(img, name)
    }

    fn from_image(img: image::DynamicImage, name: String) -> Result<Self, RenderError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();
        Self::from_pixels(width as usize, height as usize, pixels, name)
    }

    /// 1x1 texture of a single color
    pub fn solid(color: Color, name: impl Into<String>) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
            name: name.into(),
        }
    }

    /// Create a checkerboard test texture (8x8 texel cells)
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 8) + (y / 8)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Get pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Color::BLACK
        }
    }

    /// Sample at UV coordinates in [0,1] (clamped to the edge)
    pub fn sample(&self, u: f32, v: f32, filter: FilterMode) -> Vec3 {
        match filter {
            FilterMode::Nearest => self.sample_nearest(u, v),
            FilterMode::Bilinear => self.sample_bilinear(u, v),
        }
    }

    pub fn sample_nearest(&self, u: f32, v: f32) -> Vec3 {
        let tx = ((clamp_unit(u) * self.width as f32) as usize).min(self.width - 1);
        let ty = ((clamp_unit(v) * self.height as f32) as usize).min(self.height - 1);
        self.pixels[ty * self.width + tx].to_vec3()
    }

    pub fn sample_bilinear(&self, u: f32, v: f32) -> Vec3 {
        let fx = (clamp_unit(u) * self.width as f32 - 0.5).max(0.0);
        let fy = (clamp_unit(v) * self.height as f32 - 0.5).max(0.0);

        let x0 = (fx as usize).min(self.width - 1);
        let y0 = (fy as usize).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = (fx - x0 as f32).clamp(0.0, 1.0);
        let ty = (fy - y0 as f32).clamp(0.0, 1.0);

        let c00 = self.pixels[y0 * self.width + x0].to_vec3();
        let c10 = self.pixels[y0 * self.width + x1].to_vec3();
        let c01 = self.pixels[y1 * self.width + x0].to_vec3();
        let c11 = self.pixels[y1 * self.width + x1].to_vec3();

        let top = c00.lerp(c10, tx);
        let bottom = c01.lerp(c11, tx);
        top.lerp(bottom, ty)
    }
}

/// NaN-safe clamp to [0,1]
#[inline]
fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
