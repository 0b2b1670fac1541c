use bevy_ecs::prelude::Entity;
use glam::Vec3;

use crate::ecs::EcsWorld;

/// Axis-aligned box stored as centre and half size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3 {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::point(Vec3::ZERO)
    }
}

impl Bounds3 {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents: extents.abs() }
    }

    /// Zero-sized box at `point`.
    pub fn point(point: Vec3) -> Self {
        Self { center: point, extents: Vec3::ZERO }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let (lo, hi) = (min.min(max), min.max(max));
        Self { center: (lo + hi) * 0.5, extents: (hi - lo) * 0.5 }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    pub fn encapsulate_point(&mut self, point: Vec3) {
        *self = Self::from_min_max(self.min().min(point), self.max().max(point));
    }

    pub fn encapsulate(&mut self, other: &Bounds3) {
        *self = Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()));
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        point.cmpge(min).all() && point.cmple(max).all()
    }
}

/// World-space render bounds of one object, if it draws a registered mesh.
pub fn render_bounds(world: &EcsWorld, entity: Entity) -> Option<Bounds3> {
    let mesh_key = world.mesh_key(entity)?;
    let mesh_bounds = world.meshes().mesh_bounds(mesh_key)?;
    let matrix = world.world_matrix(entity)?;
    let (min, max) = mesh_bounds.transformed(&matrix);
    Some(Bounds3::from_min_max(min, max))
}

/// Folds the render bounds of `objects` into a box that starts as a point at `anchor`.
pub fn object_list_bounds(world: &EcsWorld, objects: &[Entity], anchor: Vec3) -> Bounds3 {
    objects.iter().filter_map(|&entity| render_bounds(world, entity)).fold(Bounds3::point(anchor), |mut acc, b| {
        acc.encapsulate(&b);
        acc
    })
}

/// Bounds of `root` and every descendant, anchored at the root's position.
pub fn hierarchy_bounds(world: &EcsWorld, root: Entity) -> Bounds3 {
    let mut objects = Vec::new();
    let mut stack = vec![root];
    while let Some(entity) = stack.pop() {
        objects.push(entity);
        stack.extend(world.children(entity).iter().copied());
    }
    let anchor = world.position(root).unwrap_or(Vec3::ZERO);
    object_list_bounds(world, &objects, anchor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Transform3D;

    #[test]
    fn encapsulate_grows_to_cover_both() {
        let mut a = Bounds3::point(Vec3::ZERO);
        a.encapsulate(&Bounds3::new(Vec3::new(2.0, 0.0, 0.0), Vec3::splat(0.5)));
        assert_eq!(a.min(), Vec3::new(0.0, -0.5, -0.5));
        assert_eq!(a.max(), Vec3::new(2.5, 0.5, 0.5));
        assert!(a.contains(Vec3::new(1.0, 0.0, 0.0)));
        assert!(!a.contains(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn list_bounds_starts_at_anchor_and_skips_meshless_objects() {
        let mut ecs = EcsWorld::new();
        let proxy = ecs.instantiate_proxy("cube", false);
        ecs.set_position(proxy, Vec3::new(4.0, 0.0, 0.0));
        let empty = ecs.spawn_object("empty", Transform3D::from_translation(Vec3::new(-50.0, 0.0, 0.0)));
        let bounds = object_list_bounds(&ecs, &[proxy, empty], Vec3::ZERO);
        assert_eq!(bounds.min(), Vec3::new(0.0, -0.5, -0.5));
        assert_eq!(bounds.max(), Vec3::new(4.5, 0.5, 0.5));
    }

    #[test]
    fn empty_list_yields_degenerate_box_at_anchor() {
        let ecs = EcsWorld::new();
        let anchor = Vec3::new(1.0, 2.0, 3.0);
        let bounds = object_list_bounds(&ecs, &[], anchor);
        assert_eq!(bounds, Bounds3::point(anchor));
    }

    #[test]
    fn hierarchy_bounds_include_children() {
        let mut ecs = EcsWorld::new();
        let root = ecs.spawn_object("root", Transform3D::default());
        let child = ecs.instantiate_proxy("cube", false);
        ecs.set_parent(child, Some(root));
        ecs.set_local_position(child, Vec3::new(0.0, 3.0, 0.0));
        let bounds = hierarchy_bounds(&ecs, root);
        assert!((bounds.max().y - 3.5).abs() < 1e-5);
        assert!(bounds.min().y.abs() < 1e-5);
    }
}
