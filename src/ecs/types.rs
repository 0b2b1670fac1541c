use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}
impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}
impl Transform3D {
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Default::default() }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}
#[derive(Component, Clone, Copy, Default)]
pub struct WorldTransform3D(pub Mat4);
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);
#[derive(Component, Default, Debug)]
pub struct Children(pub Vec<Entity>);

/// Mirrors a scene object's own active flag; inactive roots ignore pause/play requests.
#[derive(Component, Clone, Copy, Debug)]
pub struct ActiveSelf(pub bool);
impl Default for ActiveSelf {
    fn default() -> Self {
        Self(true)
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct Name(pub String);

#[derive(Component, Clone, Debug)]
pub struct MeshFilter {
    pub mesh: String,
}

#[derive(Component, Clone, Debug)]
pub struct MeshCollider {
    pub mesh: String,
    pub convex: bool,
}

/// Per-object material instance. Mutating it never affects the emitter's shared material.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub key: String,
    pub main_texture: Option<String>,
    pub color: Vec4,
    pub texture_scale: Vec2,
    pub texture_offset: Vec2,
}
impl Default for Material {
    fn default() -> Self {
        Self {
            key: "default".to_string(),
            main_texture: None,
            color: Vec4::ONE,
            texture_scale: Vec2::ONE,
            texture_offset: Vec2::ZERO,
        }
    }
}
impl Material {
    pub fn textured(key: impl Into<String>, texture: impl Into<String>) -> Self {
        Self { key: key.into(), main_texture: Some(texture.into()), ..Default::default() }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

#[derive(Component, Clone, Debug, Default)]
pub struct MeshRenderer {
    pub material: Option<Material>,
}

/// Marks a scene object as the stand-in for one frozen particle.
/// `collider` indexes the owning helper's collider arena, `slot` the proxy within it.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticleProxyTag {
    pub emitter: Entity,
    pub collider: usize,
    pub slot: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}
impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RaycastHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
    /// Interpolated mesh UV; only non-convex mesh colliders report one.
    pub texture_coord: Option<Vec2>,
}
