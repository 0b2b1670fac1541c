use bevy_ecs::prelude::Entity;
use glam::{UVec2, Vec2};

use super::hit_test::{resolve_pointer_hit, ProxyHit};
use super::system_collider::ParticleSystemCollider;
use crate::bounds::Bounds3;
use crate::camera3d::Camera3D;
use crate::config::ProbeConfig;
use crate::ecs::EcsWorld;
use crate::error::ProbeError;
use crate::pixel_sampler::{BlitPixelSampler, PixelSampler};

/// Freezes every emitter under a root object and keeps the frozen particles pickable.
///
/// Colliders live in an arena indexed by emitter order; proxies refer back to
/// them through `ParticleProxyTag::collider`.
pub struct CollisionHelper<S: PixelSampler = BlitPixelSampler> {
    root: Entity,
    colliders: Vec<ParticleSystemCollider>,
    sampler: S,
    alpha_cutoff: f32,
    paused: bool,
}

impl CollisionHelper<BlitPixelSampler> {
    pub fn new(world: &EcsWorld, root: Entity, config: &ProbeConfig) -> Self {
        Self::with_sampler(world, root, config, BlitPixelSampler::new())
    }
}

impl<S: PixelSampler> CollisionHelper<S> {
    pub fn with_sampler(world: &EcsWorld, root: Entity, config: &ProbeConfig, sampler: S) -> Self {
        let template = config.proxy_template();
        let colliders: Vec<ParticleSystemCollider> = world
            .particle_systems_in_hierarchy(root)
            .into_iter()
            .enumerate()
            .map(|(index, emitter)| ParticleSystemCollider::new(emitter, index, template.clone()))
            .collect();
        log::debug!("collision helper on {root:?} tracks {} emitter(s)", colliders.len());
        Self { root, colliders, sampler, alpha_cutoff: config.alpha_cutoff, paused: false }
    }

    pub fn root(&self) -> Entity {
        self.root
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn colliders(&self) -> &[ParticleSystemCollider] {
        &self.colliders
    }

    pub fn collider(&self, index: usize) -> Option<&ParticleSystemCollider> {
        self.colliders.get(index)
    }

    pub fn proxy_count(&self) -> usize {
        self.colliders.iter().map(ParticleSystemCollider::len).sum()
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn alpha_cutoff(&self) -> f32 {
        self.alpha_cutoff
    }

    pub fn set_alpha_cutoff(&mut self, cutoff: f32) {
        self.alpha_cutoff = cutoff;
    }

    /// Pauses every emitter and captures its particles as proxies.
    /// Ignored while the root object is inactive.
    pub fn pause(&mut self, world: &mut EcsWorld) -> bool {
        if !world.is_active(self.root) {
            log::debug!("pause ignored: root {:?} is inactive", self.root);
            return false;
        }
        for collider in &mut self.colliders {
            match world.particle_system_mut(collider.emitter()) {
                Some(system) => system.pause(true),
                None => {
                    log::warn!("{}", ProbeError::MissingEntity(collider.emitter()));
                    continue;
                }
            }
            collider.create_particle_colliders(world);
        }
        self.paused = true;
        log::info!("paused {} emitter(s) with {} proxies", self.colliders.len(), self.proxy_count());
        true
    }

    /// Destroys all proxies and resumes the emitters.
    pub fn play(&mut self, world: &mut EcsWorld) -> bool {
        if !world.is_active(self.root) {
            log::debug!("play ignored: root {:?} is inactive", self.root);
            return false;
        }
        for collider in &mut self.colliders {
            collider.clear_particle_colliders(world);
            if let Some(system) = world.particle_system_mut(collider.emitter()) {
                system.play(true);
            }
        }
        self.paused = false;
        log::info!("resumed {} emitter(s)", self.colliders.len());
        true
    }

    /// Per-frame tick: rebuild every proxy, refresh world transforms, then resolve
    /// `pointer_press` (screen pixels, top-left origin) if one happened this frame.
    pub fn update(
        &mut self,
        world: &mut EcsWorld,
        camera: &Camera3D,
        viewport: UVec2,
        pointer_press: Option<Vec2>,
    ) -> Option<ProxyHit> {
        if !self.paused {
            return None;
        }
        for collider in &self.colliders {
            // Issues are already logged by the collider.
            let _ = collider.reconstruct(world, camera);
        }
        world.propagate_transforms();

        let pointer = pointer_press?;
        let ray = camera.screen_ray(pointer, viewport)?;
        resolve_pointer_hit(world, &ray, &self.colliders, &mut self.sampler, self.alpha_cutoff)
    }

    /// Proxy bounds of the emitter at `emitter_index`.
    pub fn bounds(&self, world: &EcsWorld, emitter_index: usize) -> Option<Bounds3> {
        self.colliders.get(emitter_index).map(|collider| collider.bounds(world))
    }
}
