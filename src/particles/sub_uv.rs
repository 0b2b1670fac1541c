use super::render_config::TextureSheetAnimation;
use crate::error::{ProbeError, ProbeResult};
use glam::Vec2;

/// Normalized elapsed lifetime of a particle. A zero start lifetime has no defined
/// progress and is reported as an error.
pub fn try_lifetime_progress(start_lifetime: f32, remaining_lifetime: f32) -> ProbeResult<f32> {
    if start_lifetime == 0.0 {
        return Err(ProbeError::DegenerateLifetime);
    }
    Ok((start_lifetime - remaining_lifetime) / start_lifetime)
}

/// Like [`try_lifetime_progress`] but degenerate lifetimes resolve to 0.
pub fn lifetime_progress(start_lifetime: f32, remaining_lifetime: f32) -> f32 {
    try_lifetime_progress(start_lifetime, remaining_lifetime).unwrap_or_else(|err| {
        log::trace!("{err}; progress treated as 0");
        0.0
    })
}

/// Which tile of a texture sheet a particle is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubUvFrameInfo {
    pub columns: u32,
    pub rows: u32,
    pub total_frames: u32,
    /// Not clamped to `total_frames`; curves that overshoot index past the grid.
    pub current_frame: i32,
    pub current_column: i32,
    pub current_row: i32,
}

impl SubUvFrameInfo {
    pub fn resolve(sheet: &TextureSheetAnimation, start_lifetime: f32, remaining_lifetime: f32) -> Self {
        let progress = lifetime_progress(start_lifetime, remaining_lifetime);
        Self::at_progress(sheet, progress)
    }

    pub fn at_progress(sheet: &TextureSheetAnimation, progress: f32) -> Self {
        let columns = sheet.columns();
        let rows = sheet.rows();
        let total_frames = columns.saturating_mul(rows);
        let start = sheet.start_frame.evaluate(progress);
        let animated = (sheet.frame_over_time.evaluate(progress) * total_frames as f32).floor();
        let current_frame = (start + animated) as i32;
        let c = columns.min(i32::MAX as u32) as i32;
        Self {
            columns,
            rows,
            total_frames,
            current_frame,
            current_column: current_frame.rem_euclid(c),
            current_row: current_frame.div_euclid(c),
        }
    }

    /// Material tiling and offset that show the current tile. Rows count downwards on the
    /// sheet while texture V grows upwards, hence the flip.
    pub fn texture_scale_offset(&self) -> (Vec2, Vec2) {
        let c = self.columns as f32;
        let r = self.rows as f32;
        let scale = Vec2::new(1.0 / c, 1.0 / r);
        let offset = Vec2::new(self.current_column as f32 / c, (r - self.current_row as f32 - 1.0) / r);
        (scale, offset)
    }

    /// Maps a UV on the proxy quad into the current tile, in sampling orientation.
    pub fn remap_uv(&self, uv: Vec2) -> Vec2 {
        let c = self.columns as f32;
        let r = self.rows as f32;
        let u = self.current_column as f32 / c + uv.x / c;
        let v = self.current_row as f32 / r + (1.0 - uv.y) / r;
        Vec2::new(u, 1.0 - v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::MinMaxCurve;

    fn sheet(columns: u32, rows: u32, start: f32, animation: f32) -> TextureSheetAnimation {
        TextureSheetAnimation {
            start_frame: MinMaxCurve::constant(start),
            frame_over_time: MinMaxCurve::constant(animation),
            ..TextureSheetAnimation::whole_sheet(columns, rows)
        }
    }

    #[test]
    fn half_way_through_a_four_by_two_sheet() {
        let info = SubUvFrameInfo::at_progress(&sheet(4, 2, 0.0, 0.5), 0.3);
        assert_eq!(info.total_frames, 8);
        assert_eq!(info.current_frame, 4);
        assert_eq!(info.current_column, 0);
        assert_eq!(info.current_row, 1);
    }

    #[test]
    fn linear_animation_follows_lifetime() {
        let sheet = TextureSheetAnimation::whole_sheet(4, 2);
        let info = SubUvFrameInfo::resolve(&sheet, 2.0, 0.5);
        // progress 0.75 -> floor(6.0)
        assert_eq!(info.current_frame, 6);
        assert_eq!((info.current_column, info.current_row), (2, 1));
    }

    #[test]
    fn zero_start_lifetime_resolves_to_first_frame() {
        assert!(matches!(try_lifetime_progress(0.0, 0.0), Err(ProbeError::DegenerateLifetime)));
        let info = SubUvFrameInfo::resolve(&TextureSheetAnimation::whole_sheet(4, 2), 0.0, 0.0);
        assert_eq!(info.current_frame, 0);
    }

    #[test]
    fn overshooting_frames_are_not_clamped() {
        let info = SubUvFrameInfo::at_progress(&sheet(4, 2, 9.0, 0.0), 0.0);
        assert_eq!(info.current_frame, 9);
        assert_eq!((info.current_column, info.current_row), (1, 2));
    }

    #[test]
    fn remap_uv_lands_inside_the_tile() {
        let info = SubUvFrameInfo {
            columns: 4,
            rows: 2,
            total_frames: 8,
            current_frame: 5,
            current_column: 1,
            current_row: 1,
        };
        let uv = info.remap_uv(Vec2::new(0.5, 0.5));
        assert!((uv.x - 0.375).abs() < 1e-6, "u was {}", uv.x);
        assert!((uv.y - 0.25).abs() < 1e-6, "v was {}", uv.y);
    }

    #[test]
    fn oversized_grids_saturate_the_frame_count() {
        let info = SubUvFrameInfo::at_progress(&sheet(70_000, 70_000, 3.0, 0.0), 0.0);
        assert_eq!(info.total_frames, u32::MAX);
        assert_eq!((info.current_column, info.current_row), (3, 0));
    }

    #[test]
    fn scale_offset_flips_rows() {
        let info = SubUvFrameInfo::at_progress(&sheet(4, 2, 0.0, 0.0), 0.0);
        let (scale, offset) = info.texture_scale_offset();
        assert_eq!(scale, Vec2::new(0.25, 0.5));
        assert_eq!(offset, Vec2::new(0.0, 0.5));
    }
}
