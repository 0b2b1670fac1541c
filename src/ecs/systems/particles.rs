use super::TimeDelta;
use crate::ecs::types::WorldTransform3D;
use crate::particles::ParticleSystem;
use bevy_ecs::prelude::*;
use glam::Mat4;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Random source shared by every emitter so runs can be seeded.
#[derive(Resource)]
pub struct ParticleRng(pub StdRng);

impl ParticleRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

pub fn sys_simulate_particle_systems(
    mut systems: Query<(&mut ParticleSystem, Option<&WorldTransform3D>)>,
    dt: Res<TimeDelta>,
    mut rng: ResMut<ParticleRng>,
) {
    for (mut system, world) in systems.iter_mut() {
        if system.is_paused() {
            continue;
        }
        let emitter_world = world.map_or(Mat4::IDENTITY, |w| w.0);
        system.simulate(dt.0, &emitter_world, &mut rng.0);
    }
}
