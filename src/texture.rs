use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use bevy_ecs::prelude::Resource;
use glam::Vec4;
use image::{DynamicImage, ImageReader, RgbaImage};

use crate::error::{ProbeError, ProbeResult};

/// A texture as uploaded for rendering. Non-readable textures refuse direct
/// pixel read-back; they can only be inspected by drawing them somewhere else.
#[derive(Clone, Debug)]
pub struct TextureAsset {
    key: String,
    image: RgbaImage,
    readable: bool,
}

impl TextureAsset {
    pub fn new(key: impl Into<String>, image: DynamicImage, readable: bool) -> Self {
        Self::from_rgba(key, image.to_rgba8(), readable)
    }

    pub fn from_rgba(key: impl Into<String>, image: RgbaImage, readable: bool) -> Self {
        Self { key: key.into(), image, readable }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Direct CPU read-back. `y = 0` is the bottom row; coordinates wrap.
    pub fn texel(&self, x: i32, y: i32) -> ProbeResult<Vec4> {
        if !self.readable {
            return Err(ProbeError::TextureNotReadable(self.key.clone()));
        }
        sample_wrapped(&self.image, x, y)
    }

    /// Texel storage as seen by the renderer. Only blits go through here.
    pub(crate) fn render_source(&self) -> &RgbaImage {
        &self.image
    }
}

/// Reads one texel with repeat addressing and bottom-up rows.
pub(crate) fn sample_wrapped(image: &RgbaImage, x: i32, y: i32) -> ProbeResult<Vec4> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ProbeError::EmptyTexture { width, height });
    }
    let column = x.rem_euclid(width as i32) as u32;
    let row_from_bottom = y.rem_euclid(height as i32) as u32;
    let pixel = image.get_pixel(column, height - 1 - row_from_bottom);
    let [r, g, b, a] = pixel.0;
    Ok(Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0)
}

#[derive(Resource, Default)]
pub struct TextureRegistry {
    entries: HashMap<String, TextureAsset>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: TextureAsset) {
        self.entries.insert(asset.key.clone(), asset);
    }

    /// Decodes an image file and registers it under `key`.
    pub fn load(&mut self, key: &str, path: impl AsRef<Path>, readable: bool) -> Result<()> {
        let path = path.as_ref();
        let image = ImageReader::open(path)
            .with_context(|| format!("Failed to open texture '{}'", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to detect format of '{}'", path.display()))?
            .decode()
            .with_context(|| format!("Failed to decode texture '{}'", path.display()))?;
        log::debug!("loaded texture '{key}' ({}x{}) from {}", image.width(), image.height(), path.display());
        self.insert(TextureAsset::new(key, image, readable));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&TextureAsset> {
        self.entries.get(key)
    }

    pub fn require(&self, key: &str) -> ProbeResult<&TextureAsset> {
        self.entries.get(key).ok_or_else(|| ProbeError::UnknownTexture(key.to_string()))
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn two_by_two(readable: bool) -> TextureAsset {
        let mut image = RgbaImage::new(2, 2);
        // Top row in image memory.
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        // Bottom row.
        image.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        image.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        TextureAsset::from_rgba("checker", image, readable)
    }

    #[test]
    fn texel_rows_count_from_the_bottom() {
        let texture = two_by_two(true);
        assert_eq!(texture.texel(0, 0).expect("readable"), Vec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(texture.texel(0, 1).expect("readable"), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn texel_coordinates_wrap() {
        let texture = two_by_two(true);
        assert_eq!(texture.texel(3, 2).expect("readable"), texture.texel(1, 0).expect("readable"));
        assert_eq!(texture.texel(-1, -1).expect("readable"), texture.texel(1, 1).expect("readable"));
    }

    #[test]
    fn non_readable_textures_refuse_read_back() {
        let texture = two_by_two(false);
        assert!(matches!(texture.texel(0, 0), Err(ProbeError::TextureNotReadable(key)) if key == "checker"));
    }

    #[test]
    fn load_decodes_png_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sheet.png");
        two_by_two(true).render_source().save(&path).expect("write png");
        let mut registry = TextureRegistry::new();
        registry.load("sheet", &path, false).expect("load png");
        let texture = registry.require("sheet").expect("registered");
        assert_eq!((texture.width(), texture.height()), (2, 2));
        assert!(!texture.is_readable());
        assert!(matches!(registry.require("missing"), Err(ProbeError::UnknownTexture(_))));
    }
}
