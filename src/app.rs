use anyhow::{Context, Result};
use bevy_ecs::prelude::Entity;
use glam::{UVec2, Vec2};
use image::{Rgba, RgbaImage};
use std::fmt;

use crate::camera3d::Camera3D;
use crate::config::AppConfig;
use crate::ecs::{EcsWorld, Transform3D};
use crate::probe::{CollisionHelper, HitOutcome};
use crate::texture::TextureAsset;

pub const DEFAULT_CONFIG_PATH: &str = "config/probe.json";
pub const DEMO_SHEET_KEY: &str = "demo_sheet";

/// What one demo session observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSummary {
    pub emitters: usize,
    pub proxies: usize,
    pub clicks: usize,
    pub sampled: usize,
    pub accepted: usize,
    pub coarse: usize,
    pub missed: usize,
}

impl fmt::Display for DemoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "emitters={} proxies={} clicks={} sampled={} accepted={} coarse={} missed={}",
            self.emitters, self.proxies, self.clicks, self.sampled, self.accepted, self.coarse, self.missed
        )
    }
}

pub struct App {
    pub ecs: EcsWorld,
    pub camera: Camera3D,
    pub viewport: UVec2,
    pub root: Entity,
    pub helper: CollisionHelper,
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut ecs = EcsWorld::seeded(config.demo.seed);
        match &config.demo.sheet_path {
            Some(path) => ecs
                .textures_mut()
                .load(DEMO_SHEET_KEY, path, false)
                .with_context(|| format!("Failed to load demo sheet '{path}'"))?,
            None => {
                let (columns, rows) = sheet_grid(&config);
                let image = generate_sheet(columns, rows, config.demo.tile_size);
                ecs.textures_mut().insert(TextureAsset::from_rgba(DEMO_SHEET_KEY, image, false));
            }
        }

        let root = ecs.spawn_object("particle_root", Transform3D::default());
        for settings in &config.demo.emitters {
            let emitter = ecs.spawn_particle_system(settings, Some(root));
            log::debug!("spawned emitter '{}' as {emitter:?}", settings.name);
        }
        ecs.propagate_transforms();

        let helper = CollisionHelper::new(&ecs, root, &config.probe);
        Ok(Self {
            ecs,
            camera: config.camera.to_camera(),
            viewport: config.viewport.size(),
            root,
            helper,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the live simulation for the configured warm-up time.
    pub fn warm_up(&mut self) {
        let dt = self.config.demo.frame_dt.max(1e-4);
        let frames = (self.config.demo.warmup_seconds / dt).ceil() as usize;
        for _ in 0..frames {
            self.ecs.update(dt);
        }
        log::debug!("warm-up ran {frames} frames");
    }

    /// Screen positions of proxy centres visible from the camera, in proxy order.
    pub fn proxy_click_targets(&self) -> Vec<Vec2> {
        self.helper
            .colliders()
            .iter()
            .flat_map(|collider| collider.proxies().iter())
            .filter_map(|proxy| self.ecs.position(proxy.entity))
            .filter_map(|point| self.camera.project_point(point, self.viewport))
            .filter(|p| p.x >= 0.0 && p.y >= 0.0 && p.x < self.viewport.x as f32 && p.y < self.viewport.y as f32)
            .collect()
    }

    /// Warm up, freeze, click across the frozen proxies, then resume.
    pub fn run_demo(&mut self) -> Result<DemoSummary> {
        self.warm_up();
        if !self.helper.pause(&mut self.ecs) {
            anyhow::bail!("Particle root {:?} is inactive; nothing to probe", self.root);
        }
        // First tick places the proxies so their centres can be projected.
        self.helper.update(&mut self.ecs, &self.camera, self.viewport, None);

        let mut summary = DemoSummary {
            emitters: self.helper.colliders().len(),
            proxies: self.helper.proxy_count(),
            ..Default::default()
        };
        let targets = self.proxy_click_targets();
        for point in targets.into_iter().take(self.config.demo.clicks) {
            summary.clicks += 1;
            match self.helper.update(&mut self.ecs, &self.camera, self.viewport, Some(point)) {
                Some(hit) => match hit.outcome {
                    HitOutcome::Sampled { accepted, .. } => {
                        summary.sampled += 1;
                        if accepted {
                            summary.accepted += 1;
                        }
                    }
                    HitOutcome::Coarse { .. } => summary.coarse += 1,
                },
                None => summary.missed += 1,
            }
        }
        for event in self.ecs.drain_events() {
            log::debug!("{event}");
        }

        self.helper.play(&mut self.ecs);
        log::info!("{summary}");
        Ok(summary)
    }
}

/// Builds the demo scene from `config` and runs it. A configured `demo.sheet_path` is
/// read from disk; otherwise the sprite sheet is generated.
pub fn run_with_config(config: AppConfig) -> Result<DemoSummary> {
    let mut app = App::new(config)?;
    app.run_demo()
}

pub fn run() -> Result<DemoSummary> {
    run_with_config(AppConfig::load_or_default(DEFAULT_CONFIG_PATH))
}

fn sheet_grid(config: &AppConfig) -> (u32, u32) {
    config
        .demo
        .emitters
        .iter()
        .filter(|e| e.texture.as_deref() == Some(DEMO_SHEET_KEY))
        .find_map(|e| e.texture_sheet.as_ref().map(|s| (s.tiles_x.max(1), s.tiles_y.max(1))))
        .unwrap_or((1, 1))
}

/// Sprite sheet of `columns` x `rows` tiles, each a tinted disc on a transparent background.
pub fn generate_sheet(columns: u32, rows: u32, tile: u32) -> RgbaImage {
    let tile = tile.max(2);
    let radius = tile as f32 * 0.5;
    RgbaImage::from_fn(columns.saturating_mul(tile), rows.saturating_mul(tile), |x, y| {
        let (col, row) = (x / tile, y / tile);
        let local = Vec2::new((x % tile) as f32 + 0.5, (y % tile) as f32 + 0.5);
        if local.distance(Vec2::splat(radius)) > radius {
            return Rgba([0, 0, 0, 0]);
        }
        let index = row * columns + col;
        let frames = columns.saturating_mul(rows).max(1);
        let shade = (255 * u64::from(index + 1) / u64::from(frames)) as u8;
        Rgba([255, shade, 255 - shade, 255])
    })
}
