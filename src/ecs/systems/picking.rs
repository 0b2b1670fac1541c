use crate::ecs::types::Ray;
use crate::mesh::Mesh;
use glam::{Mat4, Vec2, Vec3};

/// Intersection of a ray with a collider, expressed in the ray's own frame.
#[derive(Clone, Copy, Debug)]
pub struct MeshIntersection {
    pub distance: f32,
    pub texture_coord: Option<Vec2>,
}

pub fn matrix_is_finite(mat: &Mat4) -> bool {
    mat.to_cols_array().iter().all(|v| v.is_finite())
}

pub fn ray_aabb_intersection(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<(f32, Vec3)> {
    let mut t_min: f32 = 0.0;
    let mut t_max: f32 = f32::INFINITY;
    let origin_arr = origin.to_array();
    let dir_arr = dir.to_array();
    let min_arr = min.to_array();
    let max_arr = max.to_array();
    for i in 0..3 {
        let o = origin_arr[i];
        let d = dir_arr[i];
        let min_axis = min_arr[i];
        let max_axis = max_arr[i];
        if d.abs() < 1e-6 {
            if o < min_axis || o > max_axis {
                return None;
            }
        } else {
            let inv_d = 1.0 / d;
            let mut t1 = (min_axis - o) * inv_d;
            let mut t2 = (max_axis - o) * inv_d;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }
    }
    if t_max < 0.0 {
        return None;
    }
    let t_hit = if t_min >= 0.0 { t_min } else { t_max };
    let hit = origin + dir * t_hit;
    Some((t_hit, hit))
}

/// Double-sided Möller–Trumbore test. Returns `(t, u, v)` where `u`/`v` weight `b` and `c`.
pub fn ray_triangle_intersection(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<(f32, f32, f32)> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some((t, u, v))
}

/// Casts `ray` (world space) against `mesh` placed by `world`.
///
/// Convex colliders only resolve the mesh's local bounding box and never report a
/// texture coordinate; concave colliders resolve the closest triangle and
/// interpolate its UVs.
pub fn ray_hit_mesh(ray: &Ray, world: &Mat4, mesh: &Mesh, convex: bool) -> Option<MeshIntersection> {
    let inv = world.inverse();
    if !matrix_is_finite(&inv) {
        return None;
    }
    // The local direction stays unnormalized so `t` remains a world-space distance.
    let origin_local = inv.transform_point3(ray.origin);
    let dir_local = inv.transform_vector3(ray.direction);
    if dir_local.length_squared() <= f32::EPSILON {
        return None;
    }

    if convex {
        let bounds = &mesh.bounds;
        let (t, _) = ray_aabb_intersection(origin_local, dir_local, bounds.min, bounds.max)?;
        return Some(MeshIntersection { distance: t, texture_coord: None });
    }

    let mut closest: Option<MeshIntersection> = None;
    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(v0), Some(v1), Some(v2)) = (mesh.vertices.get(i0), mesh.vertices.get(i1), mesh.vertices.get(i2))
        else {
            continue;
        };
        let Some((t, u, v)) = ray_triangle_intersection(
            origin_local,
            dir_local,
            Vec3::from_array(v0.position),
            Vec3::from_array(v1.position),
            Vec3::from_array(v2.position),
        ) else {
            continue;
        };
        if closest.is_some_and(|best| t >= best.distance) {
            continue;
        }
        let uv = Vec2::from_array(v0.uv) * (1.0 - u - v) + Vec2::from_array(v1.uv) * u + Vec2::from_array(v2.uv) * v;
        closest = Some(MeshIntersection { distance: t, texture_coord: Some(uv) });
    }
    closest
}
