use super::{Children, Parent, Transform3D, WorldTransform3D};
use bevy_ecs::prelude::*;
use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use smallvec::SmallVec;

/// Reused between runs of [`sys_propagate_scene_transforms`].
#[derive(Resource, Default)]
pub struct TransformPropagationScratch {
    stack: SmallVec<[(Entity, Mat4); 64]>,
    seen: Vec<u32>,
    pass: u32,
}

impl TransformPropagationScratch {
    fn begin_pass(&mut self) {
        self.stack.clear();
        self.pass = self.pass.wrapping_add(1);
        if self.pass == 0 {
            self.seen.fill(0);
            self.pass = 1;
        }
    }

    /// Returns false when `entity` was already written this pass.
    fn visit(&mut self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        if index >= self.seen.len() {
            self.seen.resize(index + 1, 0);
        }
        if self.seen[index] == self.pass {
            return false;
        }
        self.seen[index] = self.pass;
        true
    }

    fn visited(&self, entity: Entity) -> bool {
        self.seen.get(entity.index() as usize).is_some_and(|&mark| mark == self.pass)
    }
}

/// Counters from the most recent propagation pass.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformPropagationStats {
    pub roots: u32,
    pub written: u32,
    /// Objects whose `Parent` points at something without a transform; written as roots.
    pub orphans: u32,
    pub max_stack: u32,
}

/// Writes `WorldTransform3D` for every scene object, parents before children.
pub fn sys_propagate_scene_transforms(
    mut nodes: Query<(Entity, &Transform3D, Option<&Children>, &mut WorldTransform3D)>,
    roots: Query<Entity, (With<WorldTransform3D>, Without<Parent>)>,
    mut scratch: ResMut<TransformPropagationScratch>,
    mut stats: ResMut<TransformPropagationStats>,
) {
    let scratch = &mut *scratch;
    scratch.begin_pass();
    let mut pass = TransformPropagationStats::default();

    for root in roots.iter() {
        scratch.stack.push((root, Mat4::IDENTITY));
        pass.roots += 1;
    }
    while let Some((entity, parent_world)) = scratch.stack.pop() {
        let Ok((entity, local, children, mut world)) = nodes.get_mut(entity) else {
            continue;
        };
        if !scratch.visit(entity) {
            continue;
        }
        world.0 = parent_world * local.local_matrix();
        pass.written += 1;
        if let Some(children) = children {
            let parent_world = world.0;
            scratch.stack.extend(children.0.iter().rev().map(|&child| (child, parent_world)));
            pass.max_stack = pass.max_stack.max(scratch.stack.len() as u32);
        }
    }

    for (entity, local, _, mut world) in nodes.iter_mut() {
        if !scratch.visited(entity) {
            world.0 = local.local_matrix();
            pass.orphans += 1;
            pass.written += 1;
        }
    }
    *stats = pass;
}

/// Euler angles in degrees, applied roll (Z) first, then pitch (X), then yaw (Y).
pub fn euler_degrees_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler.y.to_radians(),
        euler.x.to_radians(),
        euler.z.to_radians(),
    )
}

/// Rotation whose +Z axis points along `forward` and whose +Y axis leans towards `up`.
/// Returns `None` for a zero-length forward vector.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return None;
    }
    let mut right = up.cross(forward);
    if right.length_squared() <= f32::EPSILON {
        // `up` is parallel to `forward`; pick any perpendicular axis.
        right = forward.any_orthonormal_vector();
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, forward)).normalize())
}
