use bevy_ecs::prelude::Entity;
use glam::{Quat, Vec3, Vec4};

use super::proxy::{ParticleProxy, ParticleSnapshot};
use crate::bounds::{object_list_bounds, Bounds3};
use crate::camera3d::Camera3D;
use crate::ecs::{EcsWorld, ParticleProxyTag};
use crate::error::ProbeError;
use crate::events::ProbeEvent;
use crate::particles::{
    AnimationType, LifetimeModules, RenderMode, SimulationSpace, SubUvFrameInfo, TextureSheetAnimation,
};

/// Template for the scene objects standing in for frozen particles.
#[derive(Clone, Debug)]
pub struct ProxyTemplate {
    pub mesh: String,
    pub convex_collider: bool,
}

impl Default for ProxyTemplate {
    fn default() -> Self {
        Self { mesh: crate::mesh_registry::QUAD_MESH.to_string(), convex_collider: true }
    }
}

/// Emitter state read once per reconstruction pass.
struct EmitterView {
    simulation_space: SimulationSpace,
    render_mode: RenderMode,
    pivot: Vec3,
    tint: Vec4,
    lifetime: LifetimeModules,
    sheet: TextureSheetAnimation,
    local_scale: Vec3,
}

impl EmitterView {
    fn read(world: &EcsWorld, emitter: Entity) -> Option<Self> {
        let system = world.particle_system(emitter)?;
        Some(Self {
            simulation_space: system.main.simulation_space,
            render_mode: system.renderer.render_mode,
            pivot: system.renderer.pivot,
            tint: system.renderer.material.color,
            lifetime: system.lifetime.clone(),
            sheet: system.texture_sheet.clone(),
            local_scale: world.local_scale(emitter).unwrap_or(Vec3::ONE),
        })
    }
}

/// Owns the proxies of one emitter for the duration of a pause.
#[derive(Debug)]
pub struct ParticleSystemCollider {
    emitter: Entity,
    index: usize,
    template: ProxyTemplate,
    proxies: Vec<ParticleProxy>,
}

impl ParticleSystemCollider {
    pub fn new(emitter: Entity, index: usize, template: ProxyTemplate) -> Self {
        Self { emitter, index, template, proxies: Vec::new() }
    }

    pub fn emitter(&self) -> Entity {
        self.emitter
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn proxies(&self) -> &[ParticleProxy] {
        &self.proxies
    }

    pub fn proxy(&self, slot: usize) -> Option<&ParticleProxy> {
        self.proxies.get(slot)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Captures every live particle and spawns one proxy per particle.
    pub fn create_particle_colliders(&mut self, world: &mut EcsWorld) -> usize {
        self.clear_particle_colliders(world);
        let Some(system) = world.particle_system(self.emitter) else {
            log::warn!("{}", ProbeError::MissingEntity(self.emitter));
            return 0;
        };
        let snapshots: Vec<ParticleSnapshot> = system.particles().iter().map(ParticleSnapshot::capture).collect();
        let render_mode = system.renderer.render_mode;
        let emitter_material = system.renderer.material.clone();
        let emitter_mesh = system.renderer.mesh.clone();

        for (slot, snapshot) in snapshots.into_iter().enumerate() {
            let entity = world.instantiate_proxy(&self.template.mesh, self.template.convex_collider);
            world.world.entity_mut(entity).insert(ParticleProxyTag {
                emitter: self.emitter,
                collider: self.index,
                slot,
            });
            if let Some(material) = world.material_mut(entity) {
                material.key = emitter_material.key.clone();
                material.main_texture = emitter_material.main_texture.clone();
            }
            match render_mode {
                RenderMode::Billboard => {
                    if let Some(material) = world.material_mut(entity) {
                        material.color = emitter_material.color;
                    }
                }
                RenderMode::Mesh => match emitter_mesh.as_deref() {
                    Some(mesh) => {
                        world.assign_mesh(entity, mesh);
                        world.assign_collider_mesh(entity, mesh);
                    }
                    None => log::warn!("mesh-mode emitter {:?} has no mesh; proxy keeps its quad", self.emitter),
                },
                other => log::error!("{}", ProbeError::UnsupportedRenderMode(other)),
            }
            self.proxies.push(ParticleProxy { snapshot, entity });
        }

        let count = self.proxies.len();
        log::debug!("created {count} particle proxies for emitter {:?}", self.emitter);
        world.push_event(ProbeEvent::ProxiesCreated { emitter: self.emitter, count });
        count
    }

    /// Destroys every proxy. Calling it with no proxies does nothing.
    pub fn clear_particle_colliders(&mut self, world: &mut EcsWorld) -> usize {
        if self.proxies.is_empty() {
            return 0;
        }
        let count = self.proxies.len();
        for proxy in self.proxies.drain(..) {
            world.despawn_entity(proxy.entity);
        }
        log::debug!("cleared {count} particle proxies for emitter {:?}", self.emitter);
        world.push_event(ProbeEvent::ProxiesCleared { emitter: self.emitter, count });
        count
    }

    /// Re-applies every snapshot to its proxy for the current camera pose.
    /// Problems are logged and returned; none of them stop the pass.
    pub fn reconstruct(&self, world: &mut EcsWorld, camera: &Camera3D) -> Vec<ProbeError> {
        let mut issues = Vec::new();
        let Some(view) = EmitterView::read(world, self.emitter) else {
            issues.push(ProbeError::MissingEntity(self.emitter));
            return issues;
        };
        for proxy in &self.proxies {
            self.reconstruct_proxy(world, camera, &view, proxy, &mut issues);
        }
        issues
    }

    fn reconstruct_proxy(
        &self,
        world: &mut EcsWorld,
        camera: &Camera3D,
        view: &EmitterView,
        proxy: &ParticleProxy,
        issues: &mut Vec<ProbeError>,
    ) {
        let entity = proxy.entity;
        let snapshot = &proxy.snapshot;
        let mut pivot = view.pivot;
        let mut size = snapshot.current_size3d(&view.lifetime);
        let mut rotation_correction = 1.0;

        match view.simulation_space {
            SimulationSpace::Local => {
                world.set_parent(entity, Some(self.emitter));
                world.set_local_position(entity, snapshot.position());
                pivot *= view.local_scale;
            }
            SimulationSpace::World => {
                world.set_parent(entity, None);
                world.set_position(entity, snapshot.position());
                size *= view.local_scale;
            }
        }

        match view.render_mode {
            RenderMode::Billboard => {
                let position = world.position(entity).unwrap_or(Vec3::ZERO);
                world.look_at(entity, position + camera.rotation * Vec3::Z, camera.rotation * Vec3::Y);
                rotation_correction = -1.0;
            }
            RenderMode::Mesh => {
                world.set_rotation(entity, Quat::IDENTITY);
                // Sprite pivots are authored Y-up; mesh pivots swap Y and Z.
                let (y, z) = (pivot.y, pivot.z);
                pivot.z = -y;
                pivot.y = -z;
                pivot *= snapshot.current_size(&view.lifetime);
            }
            other => {
                let err = ProbeError::UnsupportedRenderMode(other);
                log::error!("{err}");
                issues.push(err);
                world.set_rotation(entity, Quat::IDENTITY);
            }
        }

        let rotation = snapshot.rotation();
        world.rotate_self(entity, Vec3::new(rotation.x, rotation.y, rotation.z * rotation_correction));
        world.set_local_scale(entity, size);

        let pivot = pivot * size;
        let right = world.right(entity).unwrap_or(Vec3::X);
        world.translate(entity, right * pivot.x);
        let up = world.up(entity).unwrap_or(Vec3::Y);
        world.translate(entity, up * pivot.y);
        let forward = world.forward(entity).unwrap_or(Vec3::Z);
        world.translate(entity, forward * -pivot.z);

        if view.sheet.enabled {
            match view.sheet.animation {
                AnimationType::WholeSheet => {
                    let info = SubUvFrameInfo::resolve(
                        &view.sheet,
                        snapshot.start_lifetime(),
                        snapshot.remaining_lifetime(),
                    );
                    let (scale, offset) = info.texture_scale_offset();
                    if let Some(material) = world.material_mut(entity) {
                        material.texture_scale = scale;
                        material.texture_offset = offset;
                    }
                }
                other => {
                    let err = ProbeError::UnsupportedAnimationType(other);
                    log::warn!("{err}");
                    issues.push(err);
                }
            }
        }

        let color = snapshot.current_color(&view.lifetime) * view.tint;
        if let Some(material) = world.material_mut(entity) {
            material.color = color;
        }
    }

    /// Tile the proxy in `slot` shows. `None` unless the emitter animates the whole
    /// sheet, since other animation types leave the proxy untiled.
    pub fn frame_info(&self, world: &EcsWorld, slot: usize) -> Option<SubUvFrameInfo> {
        let proxy = self.proxies.get(slot)?;
        let system = world.particle_system(self.emitter)?;
        let sheet = &system.texture_sheet;
        if !sheet.enabled || sheet.animation != AnimationType::WholeSheet {
            return None;
        }
        Some(SubUvFrameInfo::resolve(
            &system.texture_sheet,
            proxy.snapshot.start_lifetime(),
            proxy.snapshot.remaining_lifetime(),
        ))
    }

    /// Render bounds of all proxies, anchored at the emitter.
    pub fn bounds(&self, world: &EcsWorld) -> Bounds3 {
        let anchor = world.position(self.emitter).unwrap_or(Vec3::ZERO);
        let entities: Vec<Entity> = self.proxies.iter().map(|p| p.entity).collect();
        object_list_bounds(world, &entities, anchor)
    }
}
