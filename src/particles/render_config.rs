use super::curve::MinMaxCurve;
use crate::ecs::Material;
use glam::Vec3;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Billboard,
    Stretch,
    HorizontalBillboard,
    VerticalBillboard,
    Mesh,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    #[default]
    WholeSheet,
    SingleRow,
    Sprites,
}

/// Sprite-sheet animation settings read from the emitter.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureSheetAnimation {
    pub enabled: bool,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub animation: AnimationType,
    pub start_frame: MinMaxCurve,
    pub frame_over_time: MinMaxCurve,
}

impl Default for TextureSheetAnimation {
    fn default() -> Self {
        Self {
            enabled: false,
            tiles_x: 1,
            tiles_y: 1,
            animation: AnimationType::WholeSheet,
            start_frame: MinMaxCurve::constant(0.0),
            frame_over_time: MinMaxCurve::linear(0.0, 1.0),
        }
    }
}

impl TextureSheetAnimation {
    pub fn whole_sheet(tiles_x: u32, tiles_y: u32) -> Self {
        Self { enabled: true, tiles_x, tiles_y, ..Default::default() }
    }

    pub fn columns(&self) -> u32 {
        self.tiles_x.max(1)
    }

    pub fn rows(&self) -> u32 {
        self.tiles_y.max(1)
    }
}

/// Read-only view of the emitter's renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub render_mode: RenderMode,
    pub pivot: Vec3,
    pub material: Material,
    /// Only consulted in mesh mode.
    pub mesh: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { render_mode: RenderMode::Billboard, pivot: Vec3::ZERO, material: Material::default(), mesh: None }
    }
}
