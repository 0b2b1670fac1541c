use bevy_ecs::prelude::Entity;
use glam::{Quat, UVec2, Vec3};
use image::{Rgba, RgbaImage};
use kestrel_particle_probe::camera3d::Camera3D;
use kestrel_particle_probe::config::ProbeConfig;
use kestrel_particle_probe::ecs::{EcsWorld, Material, Transform3D};
use kestrel_particle_probe::events::ProbeEvent;
use kestrel_particle_probe::particles::{
    AnimationType, MinMaxCurve, Particle, ParticleSystem, TextureSheetAnimation,
};
use kestrel_particle_probe::probe::{CollisionHelper, HitOutcome, ProxyHit};
use kestrel_particle_probe::texture::TextureAsset;
use kestrel_particle_probe::ProbeError;

const VIEWPORT: UVec2 = UVec2::new(800, 600);

fn camera() -> Camera3D {
    Camera3D::new(Vec3::new(0.0, 0.0, -10.0), Quat::IDENTITY, 60.0_f32.to_radians(), 0.1, 100.0)
}

/// Image whose columns at or beyond `opaque_from` carry alpha `alpha`; the rest are fully transparent.
fn split_mask(width: u32, height: u32, opaque_from: u32, alpha: u8) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        if x >= opaque_from {
            Rgba([255, 255, 255, alpha])
        } else {
            Rgba([255, 255, 255, 0])
        }
    })
}

struct Probe {
    ecs: EcsWorld,
    helper: CollisionHelper,
    camera: Camera3D,
}

impl Probe {
    fn new(texture: Option<RgbaImage>, configure: impl FnOnce(&mut ParticleSystem)) -> Self {
        let mut ecs = EcsWorld::seeded(21);
        if let Some(image) = texture {
            ecs.textures_mut().insert(TextureAsset::from_rgba("mask", image, false));
        }
        let root = ecs.spawn_object("root", Transform3D::default());
        let emitter = ecs.spawn_object("puff", Transform3D::default());
        let mut system = ParticleSystem::new("puff");
        system.main.emission_rate = 0.0;
        system.renderer.material = Material::textured("particle", "mask");
        system.set_particles(vec![Particle { start_lifetime: 2.0, remaining_lifetime: 2.0, ..Default::default() }]);
        configure(&mut system);
        ecs.world.entity_mut(emitter).insert(system);
        ecs.set_parent(emitter, Some(root));

        let mut helper = CollisionHelper::new(&ecs, root, &ProbeConfig::default());
        assert!(helper.pause(&mut ecs));
        let camera = camera();
        helper.update(&mut ecs, &camera, VIEWPORT, None);
        ecs.drain_events();
        Self { ecs, helper, camera }
    }

    fn proxy(&self) -> Entity {
        self.helper.colliders()[0].proxies()[0].entity
    }

    fn click_world(&mut self, point: Vec3) -> Option<ProxyHit> {
        let screen = self.camera.project_point(point, VIEWPORT).expect("point in front of camera");
        self.helper.update(&mut self.ecs, &self.camera, VIEWPORT, Some(screen))
    }
}

#[test]
fn opaque_texel_accepts_the_click() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 2, 3)), |_| {});
    let hit = probe.click_world(Vec3::new(0.25, 0.1, 0.0)).expect("proxy under pointer");
    assert_eq!(hit.proxy, probe.proxy());
    assert_eq!(hit.slot, 0);
    match hit.outcome {
        HitOutcome::Sampled { color, pixel, accepted } => {
            assert_eq!(pixel, (3, 2));
            assert!((color.w - 3.0 / 255.0).abs() < 1e-6, "alpha was {}", color.w);
            assert!(accepted);
        }
        other => panic!("expected a sampled hit, got {other:?}"),
    }
    assert!(hit.accepted());
}

#[test]
fn transparent_texel_rejects_the_click() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 2, 3)), |_| {});
    let hit = probe.click_world(Vec3::new(-0.25, 0.1, 0.0)).expect("proxy under pointer");
    assert!(matches!(hit.outcome, HitOutcome::Sampled { accepted: false, pixel: (1, 2), .. }));
    assert!(!hit.accepted());

    let events = probe.ecs.drain_events();
    assert!(events.iter().any(|e| matches!(e, ProbeEvent::ProxyHit { sample: Some((_, false)), .. })));
}

#[test]
fn raised_cutoff_rejects_faint_texels() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 0, 3)), |_| {});
    probe.helper.set_alpha_cutoff(0.5);
    let hit = probe.click_world(Vec3::new(0.25, 0.1, 0.0)).expect("proxy under pointer");
    assert!(!hit.accepted());
}

#[test]
fn convex_collider_is_made_precise_on_first_hit() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 2, 3)), |_| {});
    let proxy = probe.proxy();
    assert_eq!(probe.ecs.collider(proxy).map(|c| c.convex), Some(true));
    probe.click_world(Vec3::new(0.25, 0.1, 0.0)).expect("proxy under pointer");
    assert_eq!(probe.ecs.collider(proxy).map(|c| c.convex), Some(false));
}

#[test]
fn missing_texture_reports_a_coarse_hit() {
    let mut probe = Probe::new(None, |system| {
        system.renderer.material.main_texture = None;
    });
    let hit = probe.click_world(Vec3::new(0.25, 0.1, 0.0)).expect("proxy under pointer");
    assert_eq!(hit.outcome, HitOutcome::Coarse { reason: ProbeError::MissingRenderSurface("main texture") });
    assert!(hit.accepted());

    let events = probe.ecs.drain_events();
    assert!(events.iter().any(|e| matches!(e, ProbeEvent::ProxyHit { sample: None, .. })));
}

#[test]
fn unregistered_texture_reports_a_coarse_hit() {
    let mut probe = Probe::new(None, |_| {});
    let hit = probe.click_world(Vec3::new(0.25, 0.1, 0.0)).expect("proxy under pointer");
    assert_eq!(hit.outcome, HitOutcome::Coarse { reason: ProbeError::UnknownTexture("mask".to_string()) });
}

#[test]
fn sub_uv_frame_selects_the_sampled_tile() {
    let sheet = |start: f32| {
        move |system: &mut ParticleSystem| {
            system.texture_sheet = TextureSheetAnimation {
                start_frame: MinMaxCurve::constant(start),
                ..TextureSheetAnimation::whole_sheet(2, 1)
            };
        }
    };

    let mut second_tile = Probe::new(Some(split_mask(4, 2, 2, 255)), sheet(1.0));
    let hit = second_tile.click_world(Vec3::new(0.1, -0.1, 0.0)).expect("proxy under pointer");
    assert!(matches!(hit.outcome, HitOutcome::Sampled { accepted: true, pixel: (3, 0), .. }), "{hit:?}");

    let mut first_tile = Probe::new(Some(split_mask(4, 2, 2, 255)), sheet(0.0));
    let hit = first_tile.click_world(Vec3::new(0.1, -0.1, 0.0)).expect("proxy under pointer");
    assert!(matches!(hit.outcome, HitOutcome::Sampled { accepted: false, pixel: (1, 0), .. }), "{hit:?}");
}

#[test]
fn untiled_animation_types_sample_the_whole_sheet() {
    let mut probe = Probe::new(Some(split_mask(4, 2, 2, 255)), |system| {
        system.texture_sheet = TextureSheetAnimation {
            animation: AnimationType::SingleRow,
            start_frame: MinMaxCurve::constant(0.0),
            ..TextureSheetAnimation::whole_sheet(2, 1)
        };
    });
    let hit = probe.click_world(Vec3::new(0.1, -0.1, 0.0)).expect("proxy under pointer");
    // The proxy shows the full sheet, so quad u 0.6 maps straight to column 2.
    assert!(matches!(hit.outcome, HitOutcome::Sampled { accepted: true, pixel: (2, 0), .. }), "{hit:?}");
}

#[test]
fn non_proxy_blocker_hides_the_particle() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 2, 3)), |_| {});
    let wall = probe.ecs.instantiate_proxy("quad", false);
    probe.ecs.set_position(wall, Vec3::new(0.0, 0.0, -5.0));
    probe.ecs.set_local_scale(wall, Vec3::splat(4.0));
    assert!(probe.click_world(Vec3::new(0.25, 0.1, 0.0)).is_none());
}

#[test]
fn clicking_empty_space_misses() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 2, 3)), |_| {});
    assert!(probe.click_world(Vec3::new(3.0, 3.0, 0.0)).is_none());
}

#[test]
fn sampling_returns_every_render_target() {
    let mut probe = Probe::new(Some(split_mask(4, 4, 2, 3)), |_| {});
    for x in [-0.4, -0.1, 0.2, 0.45] {
        probe.click_world(Vec3::new(x, 0.3, 0.0));
    }
    let pool = probe.helper.sampler().pool();
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.allocations(), 1, "one target is reused across clicks");
}
