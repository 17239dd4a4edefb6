//! Render settings
//!
//! Stored as RON. Every field has a default, so a settings file only needs
//! to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rasterizer::{FilterMode, HEIGHT, WIDTH};
use crate::scene::Camera;
use crate::shading::SkyboxSampling;

/// Error type for settings loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxSettings {
    pub enabled: bool,
    pub sampling: SkyboxSampling,
    /// Keep the box centered on the camera
    pub strip_translation: bool,
    /// Grid cells per cube face edge
    pub subdivisions: usize,
}

impl Default for SkyboxSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sampling: SkyboxSampling::default(),
            strip_translation: true,
            subdivisions: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireframeSettings {
    pub enabled: bool,
    pub color: (u8, u8, u8),
}

impl Default for WireframeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            color: (255, 255, 255),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Starting orbit distance
    pub distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            distance: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    /// Pixel worker threads, fixed once the renderer is created
    pub workers: usize,
    pub texture_filter: FilterMode,
    pub clear_color: (u8, u8, u8),
    pub skybox: SkyboxSettings,
    pub wireframe: WireframeSettings,
    pub camera: CameraSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            workers: default_workers(),
            texture_filter: FilterMode::default(),
            clear_color: (20, 20, 28),
            skybox: SkyboxSettings::default(),
            wireframe: WireframeSettings::default(),
            camera: CameraSettings::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

impl RenderSettings {
    /// Load settings from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        let settings: RenderSettings = ron::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());

        let contents = ron::ser::to_string_pretty(self, config)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "viewport {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        let CameraSettings { near, far, fov_degrees, .. } = self.camera;
        if !(near > 0.0 && near < far) {
            return Err(ConfigError::Invalid(format!(
                "camera planes need 0 < near < far, got near {} far {}",
                near, far
            )));
        }
        if !(fov_degrees > 0.0 && fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!("fov {} out of range", fov_degrees)));
        }
        if self.skybox.subdivisions == 0 {
            return Err(ConfigError::Invalid("skybox subdivisions must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Orbit camera matching these settings
    pub fn camera(&self) -> Camera {
        let mut camera = Camera::new(self.aspect());
        camera.fov_y = self.camera.fov_degrees.to_radians();
        camera.near = self.camera.near;
        camera.far = self.camera.far;
        camera.distance = self.camera.distance;
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = RenderSettings::from_ron_str(
            "(width: 320, height: 240, workers: 3, skybox: (sampling: FaceTexcoords))",
        )
        .unwrap();
        assert_eq!((settings.width, settings.height, settings.workers), (320, 240, 3));
        assert_eq!(settings.skybox.sampling, SkyboxSampling::FaceTexcoords);
        assert!(settings.skybox.strip_translation);
        assert_eq!(settings.texture_filter, FilterMode::Bilinear);
        assert_eq!(settings.camera, CameraSettings::default());
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = RenderSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.workers >= 1);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            RenderSettings::from_ron_str("(workers: 0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderSettings::from_ron_str("(camera: (near: 5.0, far: 1.0))"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderSettings::from_ron_str("(width: 0)"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderSettings::from_ron_str("(width: \"wide\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("pbr-raster-settings-{}.ron", std::process::id()));
        let mut settings = RenderSettings::default();
        settings.texture_filter = FilterMode::Nearest;
        settings.wireframe.enabled = true;
        settings.save(&path).unwrap();

        let loaded = RenderSettings::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_camera_from_settings() {
        let mut settings = RenderSettings::default();
        settings.camera.distance = 7.5;
        let camera = settings.camera();
        assert_eq!(camera.distance, 7.5);
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.fov_y - 60f32.to_radians()).abs() < 1e-6);
    }
}
