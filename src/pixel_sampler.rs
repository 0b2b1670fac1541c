use glam::Vec4;
use image::RgbaImage;

use crate::error::{ProbeError, ProbeResult};
use crate::texture::{sample_wrapped, TextureAsset};

/// Reads one texel (color and alpha) from any texture, readable or not.
pub trait PixelSampler {
    fn sample(&mut self, texture: &TextureAsset, x: i32, y: i32) -> ProbeResult<Vec4>;
}

/// Off-screen color buffer with the same layout as the textures drawn into it.
#[derive(Debug, Default)]
pub struct RenderTarget {
    id: u64,
    image: RgbaImage,
}

impl RenderTarget {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Draws `source` over the whole target. Sizes must match.
    fn blit(&mut self, source: &RgbaImage) {
        if source.dimensions() == self.image.dimensions() {
            self.image.copy_from_slice(source.as_raw());
        }
    }

    /// Copies the target back into CPU memory.
    fn read_pixels(&self) -> RgbaImage {
        self.image.clone()
    }
}

/// Hands out temporary render targets and takes them back for reuse.
#[derive(Debug, Default)]
pub struct RenderTargetPool {
    free: Vec<RenderTarget>,
    outstanding: usize,
    allocations: usize,
    next_id: u64,
}

impl RenderTargetPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_temporary(&mut self, width: u32, height: u32) -> RenderTarget {
        self.outstanding += 1;
        if let Some(index) = self.free.iter().position(|t| t.width() == width && t.height() == height) {
            return self.free.swap_remove(index);
        }
        self.allocations += 1;
        self.next_id += 1;
        log::trace!("allocating render target #{} ({width}x{height})", self.next_id);
        RenderTarget { id: self.next_id, image: RgbaImage::new(width, height) }
    }

    pub fn release_temporary(&mut self, target: RenderTarget) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.push(target);
    }

    /// Targets handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Targets created over the pool's lifetime.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}

/// Borrowed temporary target, returned to its pool on drop.
pub struct TemporaryRenderTarget<'a> {
    pool: &'a mut RenderTargetPool,
    target: RenderTarget,
}

impl<'a> TemporaryRenderTarget<'a> {
    pub fn acquire(pool: &'a mut RenderTargetPool, width: u32, height: u32) -> Self {
        let target = pool.get_temporary(width, height);
        Self { pool, target }
    }

    pub fn target_mut(&mut self) -> &mut RenderTarget {
        &mut self.target
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }
}

impl Drop for TemporaryRenderTarget<'_> {
    fn drop(&mut self) {
        self.pool.release_temporary(std::mem::take(&mut self.target));
    }
}

/// Samples by drawing the texture into a same-sized temporary target and reading
/// that back. Nothing is cached between calls.
#[derive(Debug, Default)]
pub struct BlitPixelSampler {
    pool: RenderTargetPool,
}

impl BlitPixelSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &RenderTargetPool {
        &self.pool
    }
}

impl PixelSampler for BlitPixelSampler {
    fn sample(&mut self, texture: &TextureAsset, x: i32, y: i32) -> ProbeResult<Vec4> {
        let (width, height) = (texture.width(), texture.height());
        let mut temp = TemporaryRenderTarget::acquire(&mut self.pool, width, height);
        if width == 0 || height == 0 {
            return Err(ProbeError::EmptyTexture { width, height });
        }
        temp.target_mut().blit(texture.render_source());
        let readback = temp.target().read_pixels();
        sample_wrapped(&readback, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sheet(readable: bool) -> TextureAsset {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0]));
        image.put_pixel(1, 3, Rgba([255, 128, 0, 200]));
        TextureAsset::from_rgba("sheet", image, readable)
    }

    #[test]
    fn samples_non_readable_textures() {
        let texture = sheet(false);
        let mut sampler = BlitPixelSampler::new();
        let color = sampler.sample(&texture, 1, 0).expect("sample");
        assert!((color.w - 200.0 / 255.0).abs() < 1e-6, "alpha was {}", color.w);
        assert!((color.x - 1.0).abs() < 1e-6);
        assert_eq!(sampler.pool().outstanding(), 0);
    }

    #[test]
    fn matches_direct_read_back_on_readable_textures() {
        let texture = sheet(true);
        let mut sampler = BlitPixelSampler::new();
        for (x, y) in [(0, 0), (1, 0), (3, 3), (5, -2)] {
            assert_eq!(sampler.sample(&texture, x, y).expect("sample"), texture.texel(x, y).expect("texel"));
        }
    }

    #[test]
    fn zero_sized_texture_still_releases_target() {
        let texture = TextureAsset::from_rgba("empty", RgbaImage::new(0, 4), false);
        let mut sampler = BlitPixelSampler::new();
        for _ in 0..3 {
            let result = sampler.sample(&texture, 0, 0);
            assert!(matches!(result, Err(ProbeError::EmptyTexture { width: 0, height: 4 })));
            assert_eq!(sampler.pool().outstanding(), 0);
        }
        assert_eq!(sampler.pool().allocations(), 1, "released target should be reused");
    }

    #[test]
    fn guard_returns_target_to_pool() {
        let mut pool = RenderTargetPool::new();
        {
            let mut temp = TemporaryRenderTarget::acquire(&mut pool, 8, 8);
            temp.target_mut().blit(&RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 4])));
            assert_eq!(temp.target().read_pixels().get_pixel(7, 7).0, [1, 2, 3, 4]);
            assert_eq!(temp.target().id(), 1);
        }
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.pooled(), 1);
        let reused = pool.get_temporary(8, 8);
        assert_eq!(reused.id(), 1);
        assert_eq!(pool.allocations(), 1);
        pool.release_temporary(reused);
    }
}
