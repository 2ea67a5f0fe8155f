use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;

use crate::camera::PerspectiveCamera;
use crate::orbit::OrbitControls;

pub const ASSETS_VAR: &str = "ROCKET_SCENE_ASSETS";
pub const HEADLESS_VAR: &str = "ROCKET_SCENE_HEADLESS";
pub const SIZE_VAR: &str = "ROCKET_SCENE_SIZE";

/// Viewer settings. Compiled-in defaults, optionally overridden from the
/// environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Directory (native) or base URL (web) texture references resolve against.
    pub assets: PathBuf,
    /// Print a scene summary instead of opening a window.
    pub headless: bool,
    pub window_size: (u32, u32),
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("assets"),
            headless: false,
            window_size: (1280, 720),
            fov_y: 45.0,
            near: 0.1,
            far: 1000.0,
            camera_position: Vec3::new(60.0, 30.0, 100.0),
            camera_target: Vec3::ZERO,
            min_distance: 5.0,
            max_distance: 500.0,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup` on top of the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(assets) = lookup(ASSETS_VAR).filter(|value| !value.is_empty()) {
            config.assets = PathBuf::from(assets);
        }
        if let Some(value) = lookup(HEADLESS_VAR) {
            config.headless =
                parse_flag(&value).with_context(|| format!("invalid {HEADLESS_VAR}"))?;
        }
        if let Some(value) = lookup(SIZE_VAR) {
            config.window_size =
                parse_size(&value).with_context(|| format!("invalid {SIZE_VAR}"))?;
        }
        Ok(config)
    }

    pub fn aspect(&self) -> f32 {
        let (width, height) = self.window_size;
        width as f32 / height as f32
    }

    pub fn camera(&self) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(self.fov_y, self.aspect(), self.near, self.far)
            .with_position(self.camera_position);
        camera.look_at(self.camera_target);
        camera
    }

    pub fn orbit_controls(&self) -> OrbitControls {
        OrbitControls::new().with_distance_limits(self.min_distance, self.max_distance)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(anyhow!("expected 1/true or 0/false, got `{other}`")),
    }
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let width: u32 = width.trim().parse().context("width is not a number")?;
    let height: u32 = height.trim().parse().context("height is not a number")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("window size must be non-zero, got {width}x{height}"));
    }
    Ok((width, height))
}
