use anyhow::{Context, Result};
use glam::{UVec2, Vec3};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::camera3d::Camera3D;
use crate::mesh_registry::QUAD_MESH;
use crate::particles::EmitterSettings;
use crate::probe::ProxyTemplate;

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_width")]
    pub width: u32,
    #[serde(default = "ViewportConfig::default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    #[serde(default = "CameraConfig::default_up")]
    pub up: [f32; 3],
    #[serde(default = "CameraConfig::default_fov_y_degrees")]
    pub fov_y_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// A sampled texel must have alpha strictly above this to count as a hit.
    #[serde(default)]
    pub alpha_cutoff: f32,
    #[serde(default = "ProbeConfig::default_proxy_mesh")]
    pub proxy_mesh: String,
    #[serde(default = "ProbeConfig::default_convex_proxy_colliders")]
    pub convex_proxy_colliders: bool,
    #[serde(default = "ProbeConfig::default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "DemoConfig::default_seed")]
    pub seed: u64,
    #[serde(default = "DemoConfig::default_warmup_seconds")]
    pub warmup_seconds: f32,
    #[serde(default = "DemoConfig::default_frame_dt")]
    pub frame_dt: f32,
    #[serde(default = "DemoConfig::default_clicks")]
    pub clicks: usize,
    /// Image file for the sprite sheet; a generated sheet is used when absent.
    #[serde(default)]
    pub sheet_path: Option<String>,
    #[serde(default = "DemoConfig::default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "DemoConfig::default_emitters")]
    pub emitters: Vec<EmitterSettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub alpha_cutoff: Option<f32>,
    pub clicks: Option<usize>,
}

impl ViewportConfig {
    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: Self::default_width(), height: Self::default_height() }
    }
}

impl CameraConfig {
    fn default_position() -> [f32; 3] {
        [0.0, 0.0, -10.0]
    }

    fn default_up() -> [f32; 3] {
        [0.0, 1.0, 0.0]
    }

    fn default_fov_y_degrees() -> f32 {
        60.0
    }

    fn default_near() -> f32 {
        0.1
    }

    fn default_far() -> f32 {
        1000.0
    }

    pub fn to_camera(&self) -> Camera3D {
        Camera3D::looking_at(
            Vec3::from_array(self.position),
            Vec3::from_array(self.target),
            Vec3::from_array(self.up),
            self.fov_y_degrees.to_radians(),
            self.near,
            self.far,
        )
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Self::default_position(),
            target: [0.0; 3],
            up: Self::default_up(),
            fov_y_degrees: Self::default_fov_y_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

impl ProbeConfig {
    fn default_proxy_mesh() -> String {
        QUAD_MESH.to_string()
    }

    const fn default_convex_proxy_colliders() -> bool {
        true
    }

    fn default_log_filter() -> String {
        "info".to_string()
    }

    pub fn proxy_template(&self) -> ProxyTemplate {
        ProxyTemplate { mesh: self.proxy_mesh.clone(), convex_collider: self.convex_proxy_colliders }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            alpha_cutoff: 0.0,
            proxy_mesh: Self::default_proxy_mesh(),
            convex_proxy_colliders: Self::default_convex_proxy_colliders(),
            log_filter: Self::default_log_filter(),
        }
    }
}

impl DemoConfig {
    const fn default_seed() -> u64 {
        7
    }

    fn default_warmup_seconds() -> f32 {
        1.5
    }

    fn default_frame_dt() -> f32 {
        1.0 / 60.0
    }

    const fn default_clicks() -> usize {
        24
    }

    const fn default_tile_size() -> u32 {
        16
    }

    fn default_emitters() -> Vec<EmitterSettings> {
        let sparks = r#"{
            "name": "sparks",
            "start_lifetime": 3.0,
            "start_speed": 1.5,
            "start_size": [0.8, 0.8, 0.8],
            "rotation_speed": [0.0, 0.0, 45.0],
            "emission_rate": 12.0,
            "max_particles": 64,
            "render_mode": "billboard",
            "texture": "demo_sheet",
            "tint": [1.0, 0.9, 0.7, 1.0],
            "texture_sheet": { "tiles_x": 4, "tiles_y": 2 },
            "color_over_lifetime": { "keys": [
                { "time": 0.0, "color": [1.0, 1.0, 1.0, 1.0] },
                { "time": 1.0, "color": [1.0, 0.4, 0.2, 0.6] }
            ] }
        }"#;
        let debris = r#"{
            "name": "debris",
            "simulation_space": "world",
            "start_lifetime": 4.0,
            "start_speed": 0.8,
            "start_size": [0.4, 0.4, 0.4],
            "start_rotation": [15.0, 30.0, 0.0],
            "emission_rate": 6.0,
            "max_particles": 32,
            "render_mode": "mesh",
            "mesh": "cube",
            "texture": "demo_sheet",
            "position": [2.0, 0.0, 0.0],
            "scale": [1.5, 1.5, 1.5],
            "size_over_lifetime": { "mode": "curve", "keys": [
                { "time": 0.0, "value": 0.5 },
                { "time": 1.0, "value": 1.0 }
            ] }
        }"#;
        [sparks, debris].iter().filter_map(|raw| serde_json::from_str(raw).ok()).collect()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: Self::default_seed(),
            warmup_seconds: Self::default_warmup_seconds(),
            frame_dt: Self::default_frame_dt(),
            clicks: Self::default_clicks(),
            sheet_path: None,
            tile_size: Self::default_tile_size(),
            emitters: Self::default_emitters(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.viewport.width = width;
        }
        if let Some(height) = overrides.height {
            self.viewport.height = height;
        }
        if let Some(cutoff) = overrides.alpha_cutoff {
            self.probe.alpha_cutoff = cutoff;
        }
        if let Some(clicks) = overrides.clicks {
            self.demo.clicks = clicks;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.alpha_cutoff.is_none() && self.clicks.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.alpha_cutoff.is_some() {
            fields.push("alpha_cutoff");
        }
        if self.clicks.is_some() {
            fields.push("clicks");
        }
        fields
    }
}
