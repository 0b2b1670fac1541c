use super::systems::{ray_hit_mesh, sys_simulate_particle_systems, ParticleRng, TimeDelta};
use super::*;
use crate::events::{EventBus, ProbeEvent};
use crate::mesh_registry::MeshRegistry;
use crate::particles::{EmitterSettings, ParticleSystem};
use crate::texture::TextureRegistry;
use bevy_ecs::prelude::{Entity, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use glam::{Mat4, Quat, Vec3};

// ---------- World container ----------
pub struct EcsWorld {
    pub world: World,
    schedule_update: Schedule,
    schedule_propagate: Schedule,
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EcsWorld {
    pub fn new() -> Self {
        Self::with_rng(ParticleRng::default())
    }

    /// World whose emitters draw from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(ParticleRng::seeded(seed))
    }

    fn with_rng(rng: ParticleRng) -> Self {
        let mut world = World::new();
        world.insert_resource(TimeDelta(0.0));
        world.insert_resource(rng);
        world.insert_resource(MeshRegistry::new());
        world.insert_resource(TextureRegistry::new());
        world.insert_resource(EventBus::default());
        world.insert_resource(TransformPropagationScratch::default());
        world.insert_resource(TransformPropagationStats::default());

        let mut schedule_update = Schedule::default();
        schedule_update.add_systems((sys_simulate_particle_systems, sys_propagate_scene_transforms).chain());

        let mut schedule_propagate = Schedule::default();
        schedule_propagate.add_systems(sys_propagate_scene_transforms);

        Self { world, schedule_update, schedule_propagate }
    }

    fn emit(&mut self, event: ProbeEvent) {
        self.world.resource_mut::<EventBus>().push(event);
    }

    pub fn push_event(&mut self, event: ProbeEvent) {
        self.emit(event);
    }

    pub fn drain_events(&mut self) -> Vec<ProbeEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn meshes(&self) -> &MeshRegistry {
        self.world.resource::<MeshRegistry>()
    }

    pub fn meshes_mut(&mut self) -> bevy_ecs::world::Mut<'_, MeshRegistry> {
        self.world.resource_mut::<MeshRegistry>()
    }

    pub fn textures(&self) -> &TextureRegistry {
        self.world.resource::<TextureRegistry>()
    }

    pub fn textures_mut(&mut self) -> bevy_ecs::world::Mut<'_, TextureRegistry> {
        self.world.resource_mut::<TextureRegistry>()
    }

    /// Advances every playing emitter and refreshes world transforms.
    pub fn update(&mut self, dt: f32) {
        self.world.resource_mut::<TimeDelta>().0 = dt;
        self.schedule_update.run(&mut self.world);
    }

    pub fn propagate_transforms(&mut self) {
        self.schedule_propagate.run(&mut self.world);
    }

    pub fn transform_stats(&self) -> TransformPropagationStats {
        *self.world.resource::<TransformPropagationStats>()
    }

    // ---------- Objects ----------

    pub fn spawn_object(&mut self, name: &str, transform: Transform3D) -> Entity {
        self.world
            .spawn((transform, WorldTransform3D(transform.local_matrix()), ActiveSelf(true), Name(name.to_string())))
            .id()
    }

    /// Spawns a flat, pickable stand-in with its own material instance.
    pub fn instantiate_proxy(&mut self, mesh: &str, convex_collider: bool) -> Entity {
        let entity = self.spawn_object("particle_proxy", Transform3D::default());
        self.world.entity_mut(entity).insert((
            MeshFilter { mesh: mesh.to_string() },
            MeshCollider { mesh: mesh.to_string(), convex: convex_collider },
            MeshRenderer { material: Some(Material::default()) },
        ));
        entity
    }

    pub fn spawn_particle_system(&mut self, settings: &EmitterSettings, parent: Option<Entity>) -> Entity {
        let transform = Transform3D {
            translation: Vec3::from_array(settings.position),
            scale: Vec3::from_array(settings.scale),
            ..Default::default()
        };
        let entity = self.spawn_object(&settings.name, transform);
        self.world.entity_mut(entity).insert(ParticleSystem::from_settings(settings));
        if let Some(parent) = parent {
            self.attach_local(entity, parent);
        }
        entity
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.world.get::<Name>(entity).map(|n| n.0.as_str())
    }

    /// Despawns `entity` and its whole subtree, unlinking it from its parent.
    pub fn despawn_entity(&mut self, entity: Entity) -> bool {
        if let Some(parent) = self.world.get::<Parent>(entity).copied() {
            if let Some(mut siblings) = self.world.get_mut::<Children>(parent.0) {
                siblings.0.retain(|&child| child != entity);
            }
        }
        let child_ids = self.world.get::<Children>(entity).map(|c| c.0.clone()).unwrap_or_default();
        let mut removed = false;
        for child in child_ids {
            removed |= self.despawn_entity(child);
        }
        if self.world.despawn(entity) {
            removed = true;
            self.emit(ProbeEvent::ObjectDespawned { entity });
        }
        removed
    }

    pub fn set_active(&mut self, entity: Entity, active: bool) -> bool {
        match self.world.get_mut::<ActiveSelf>(entity) {
            Some(mut flag) => {
                flag.0 = active;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.world.get::<ActiveSelf>(entity).is_some_and(|a| a.0)
    }

    pub fn is_active_in_hierarchy(&self, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if !self.is_active(e) {
                return false;
            }
            current = self.parent(e);
        }
        true
    }

    // ---------- Hierarchy ----------

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<Parent>(entity).map(|p| p.0)
    }

    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.world.get::<Children>(entity).map(|c| c.0.as_slice()).unwrap_or(&[])
    }

    fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if e == ancestor {
                return true;
            }
            current = self.parent(e);
        }
        false
    }

    fn unlink(&mut self, child: Entity) {
        if let Some(parent) = self.world.get::<Parent>(child).copied() {
            if let Some(mut siblings) = self.world.get_mut::<Children>(parent.0) {
                siblings.0.retain(|&c| c != child);
            }
            self.world.entity_mut(child).remove::<Parent>();
        }
    }

    fn link(&mut self, child: Entity, parent: Entity) {
        self.world.entity_mut(child).insert(Parent(parent));
        if let Some(mut children) = self.world.get_mut::<Children>(parent) {
            if !children.0.contains(&child) {
                children.0.push(child);
            }
        } else {
            self.world.entity_mut(parent).insert(Children(vec![child]));
        }
    }

    /// Parents without touching the local transform.
    fn attach_local(&mut self, child: Entity, parent: Entity) {
        if self.is_ancestor(child, parent) {
            return;
        }
        self.unlink(child);
        self.link(child, parent);
    }

    /// Re-parents `child` (or detaches it with `None`) keeping its world pose.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> bool {
        if !self.entity_exists(child) || parent.is_some_and(|p| !self.entity_exists(p)) {
            return false;
        }
        if self.parent(child) == parent {
            return true;
        }
        if let Some(p) = parent {
            if self.is_ancestor(child, p) {
                log::warn!("refusing to parent {child:?} under its own descendant {p:?}");
                return false;
            }
        }
        let Some(world) = self.world_matrix(child) else {
            return false;
        };
        let parent_world = parent.and_then(|p| self.world_matrix(p)).unwrap_or(Mat4::IDENTITY);
        let local = parent_world.inverse() * world;
        let (scale, rotation, translation) = local.to_scale_rotation_translation();
        self.unlink(child);
        if let Some(p) = parent {
            self.link(child, p);
        }
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(child) {
            transform.translation = translation;
            transform.rotation = rotation.normalize();
            transform.scale = scale;
        }
        true
    }

    /// Every emitter at or below `root`, depth first in child order.
    pub fn particle_systems_in_hierarchy(&self, root: Entity) -> Vec<Entity> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if self.world.get::<ParticleSystem>(entity).is_some() {
                found.push(entity);
            }
            stack.extend(self.children(entity).iter().rev().copied());
        }
        found
    }

    pub fn particle_system(&self, entity: Entity) -> Option<&ParticleSystem> {
        self.world.get::<ParticleSystem>(entity)
    }

    pub fn particle_system_mut(&mut self, entity: Entity) -> Option<&mut ParticleSystem> {
        self.world.get_mut::<ParticleSystem>(entity).map(|s| s.into_inner())
    }

    // ---------- Transforms ----------

    /// World matrix computed from the parent chain, independent of propagation.
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        let local = self.world.get::<Transform3D>(entity)?.local_matrix();
        match self.parent(entity) {
            Some(parent) => Some(self.world_matrix(parent).unwrap_or(Mat4::IDENTITY) * local),
            None => Some(local),
        }
    }

    fn parent_matrix(&self, entity: Entity) -> Mat4 {
        self.parent(entity).and_then(|p| self.world_matrix(p)).unwrap_or(Mat4::IDENTITY)
    }

    fn parent_rotation(&self, entity: Entity) -> Quat {
        self.parent(entity).and_then(|p| self.rotation(p)).unwrap_or(Quat::IDENTITY)
    }

    pub fn local_position(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Transform3D>(entity).map(|t| t.translation)
    }

    pub fn set_local_position(&mut self, entity: Entity, position: Vec3) -> bool {
        match self.world.get_mut::<Transform3D>(entity) {
            Some(mut transform) => {
                transform.translation = position;
                true
            }
            None => false,
        }
    }

    pub fn position(&self, entity: Entity) -> Option<Vec3> {
        self.world_matrix(entity).map(|m| m.w_axis.truncate())
    }

    pub fn set_position(&mut self, entity: Entity, position: Vec3) -> bool {
        let local = self.parent_matrix(entity).inverse().transform_point3(position);
        self.set_local_position(entity, local)
    }

    /// World rotation; parent scale is ignored.
    pub fn rotation(&self, entity: Entity) -> Option<Quat> {
        let local = self.world.get::<Transform3D>(entity)?.rotation;
        Some(self.parent_rotation(entity) * local)
    }

    pub fn set_rotation(&mut self, entity: Entity, rotation: Quat) -> bool {
        let local = (self.parent_rotation(entity).inverse() * rotation).normalize();
        match self.world.get_mut::<Transform3D>(entity) {
            Some(mut transform) => {
                transform.rotation = local;
                true
            }
            None => false,
        }
    }

    /// Rotates about the object's own axes by Euler angles in degrees.
    pub fn rotate_self(&mut self, entity: Entity, euler_degrees: Vec3) -> bool {
        match self.world.get_mut::<Transform3D>(entity) {
            Some(mut transform) => {
                transform.rotation = (transform.rotation * euler_degrees_to_quat(euler_degrees)).normalize();
                true
            }
            None => false,
        }
    }

    /// Points the forward axis at `target` with the up axis leaning towards `up`.
    pub fn look_at(&mut self, entity: Entity, target: Vec3, up: Vec3) -> bool {
        let Some(position) = self.position(entity) else {
            return false;
        };
        match look_rotation(target - position, up) {
            Some(rotation) => self.set_rotation(entity, rotation),
            None => false,
        }
    }

    pub fn local_scale(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Transform3D>(entity).map(|t| t.scale)
    }

    pub fn set_local_scale(&mut self, entity: Entity, scale: Vec3) -> bool {
        match self.world.get_mut::<Transform3D>(entity) {
            Some(mut transform) => {
                transform.scale = scale;
                true
            }
            None => false,
        }
    }

    pub fn right(&self, entity: Entity) -> Option<Vec3> {
        self.rotation(entity).map(|r| r * Vec3::X)
    }

    pub fn up(&self, entity: Entity) -> Option<Vec3> {
        self.rotation(entity).map(|r| r * Vec3::Y)
    }

    pub fn forward(&self, entity: Entity) -> Option<Vec3> {
        self.rotation(entity).map(|r| r * Vec3::Z)
    }

    /// Moves the object by a world-space offset.
    pub fn translate(&mut self, entity: Entity, delta: Vec3) -> bool {
        match self.position(entity) {
            Some(position) => self.set_position(entity, position + delta),
            None => false,
        }
    }

    // ---------- Render surfaces ----------

    pub fn assign_mesh(&mut self, entity: Entity, mesh: &str) -> bool {
        if !self.entity_exists(entity) {
            return false;
        }
        self.world.entity_mut(entity).insert(MeshFilter { mesh: mesh.to_string() });
        true
    }

    pub fn assign_collider_mesh(&mut self, entity: Entity, mesh: &str) -> bool {
        match self.world.get_mut::<MeshCollider>(entity) {
            Some(mut collider) => {
                collider.mesh = mesh.to_string();
                true
            }
            None => {
                if !self.entity_exists(entity) {
                    return false;
                }
                self.world.entity_mut(entity).insert(MeshCollider { mesh: mesh.to_string(), convex: false });
                true
            }
        }
    }

    pub fn set_collider_convex(&mut self, entity: Entity, convex: bool) -> bool {
        match self.world.get_mut::<MeshCollider>(entity) {
            Some(mut collider) => {
                collider.convex = convex;
                true
            }
            None => false,
        }
    }

    pub fn collider(&self, entity: Entity) -> Option<&MeshCollider> {
        self.world.get::<MeshCollider>(entity)
    }

    pub fn mesh_key(&self, entity: Entity) -> Option<&str> {
        self.world.get::<MeshFilter>(entity).map(|f| f.mesh.as_str())
    }

    pub fn renderer(&self, entity: Entity) -> Option<&MeshRenderer> {
        self.world.get::<MeshRenderer>(entity)
    }

    pub fn material(&self, entity: Entity) -> Option<&Material> {
        self.world.get::<MeshRenderer>(entity)?.material.as_ref()
    }

    pub fn material_mut(&mut self, entity: Entity) -> Option<&mut Material> {
        self.world.get_mut::<MeshRenderer>(entity)?.into_inner().material.as_mut()
    }

    // ---------- Raycasting ----------

    /// Closest collider hit along `ray`. Inactive objects are skipped.
    pub fn raycast(&mut self, ray: &Ray) -> Option<RaycastHit> {
        let mut query = self.world.query::<(Entity, &MeshCollider)>();
        let colliders: Vec<Entity> = query.iter(&self.world).map(|(entity, _)| entity).collect();
        let mut closest: Option<RaycastHit> = None;
        for entity in colliders {
            if !self.is_active_in_hierarchy(entity) {
                continue;
            }
            let Some(hit) = self.raycast_collider(entity, ray) else {
                continue;
            };
            match closest {
                Some(best) if hit.distance >= best.distance => {}
                _ => closest = Some(hit),
            }
        }
        closest
    }

    /// Casts `ray` against a single collider.
    pub fn raycast_collider(&self, entity: Entity, ray: &Ray) -> Option<RaycastHit> {
        let collider = self.world.get::<MeshCollider>(entity)?;
        let Some(mesh) = self.meshes().get(&collider.mesh) else {
            log::warn!("collider on {entity:?} references unknown mesh '{}'", collider.mesh);
            return None;
        };
        let world = self.world_matrix(entity)?;
        let hit = ray_hit_mesh(ray, &world, mesh, collider.convex)?;
        Some(RaycastHit {
            entity,
            distance: hit.distance,
            point: ray.at(hit.distance),
            texture_coord: hit.texture_coord,
        })
    }

    pub fn proxy_tag(&self, entity: Entity) -> Option<ParticleProxyTag> {
        self.world.get::<ParticleProxyTag>(entity).copied()
    }
}
