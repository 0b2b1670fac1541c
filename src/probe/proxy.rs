use bevy_ecs::prelude::Entity;
use glam::{Vec3, Vec4};

use crate::particles::{LifetimeModules, Particle};

/// A particle's state captured at the moment its emitter was paused.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSnapshot(Particle);

impl ParticleSnapshot {
    pub fn capture(particle: &Particle) -> Self {
        Self(*particle)
    }

    pub fn particle(&self) -> &Particle {
        &self.0
    }

    pub fn position(&self) -> Vec3 {
        self.0.position
    }

    /// Degrees.
    pub fn rotation(&self) -> Vec3 {
        self.0.rotation
    }

    pub fn start_lifetime(&self) -> f32 {
        self.0.start_lifetime
    }

    pub fn remaining_lifetime(&self) -> f32 {
        self.0.remaining_lifetime
    }

    pub fn current_size3d(&self, modules: &LifetimeModules) -> Vec3 {
        self.0.current_size3d(modules)
    }

    pub fn current_size(&self, modules: &LifetimeModules) -> f32 {
        self.0.current_size(modules)
    }

    pub fn current_color(&self, modules: &LifetimeModules) -> Vec4 {
        self.0.current_color(modules)
    }
}

/// Frozen particle paired with the scene object that presents it.
#[derive(Clone, Copy, Debug)]
pub struct ParticleProxy {
    pub snapshot: ParticleSnapshot,
    pub entity: Entity,
}
