use glam::{Mat4, Vec2, Vec3};

/// Pick-only vertex: position plus the texture coordinate interpolated on hits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), uv: uv.to_array() }
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    /// Triangle list.
    pub indices: Vec<u32>,
    pub bounds: MeshBounds,
}

/// Local-space axis-aligned box around every vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
}

const FACE_UVS: [Vec2; 4] = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        let bounds = MeshBounds::from_vertices(&vertices);
        Self { vertices, indices, bounds }
    }

    /// Flat quad in the local XY plane, centred on the origin. UV (0,0) sits at the bottom-left corner.
    pub fn quad(size: f32) -> Self {
        let hs = size * 0.5;
        let vertices = vec![
            MeshVertex::new(Vec3::new(-hs, -hs, 0.0), Vec2::new(0.0, 0.0)),
            MeshVertex::new(Vec3::new(hs, -hs, 0.0), Vec2::new(1.0, 0.0)),
            MeshVertex::new(Vec3::new(-hs, hs, 0.0), Vec2::new(0.0, 1.0)),
            MeshVertex::new(Vec3::new(hs, hs, 0.0), Vec2::new(1.0, 1.0)),
        ];
        Self::new(vertices, vec![0, 3, 1, 3, 0, 2])
    }

    /// Axis-aligned cube with a full 0..1 UV square on each face.
    pub fn cube(size: f32) -> Self {
        let hs = size * 0.5;
        let corner = |i: usize| {
            Vec3::new(
                if i & 1 == 0 { -hs } else { hs },
                if i & 2 == 0 { -hs } else { hs },
                if i & 4 == 0 { -hs } else { hs },
            )
        };
        // Corner indices per face, counter-clockwise seen from outside.
        const FACES: [[usize; 4]; 6] = [
            [1, 0, 2, 3], // -Z
            [4, 5, 7, 6], // +Z
            [0, 4, 6, 2], // -X
            [5, 1, 3, 7], // +X
            [6, 7, 3, 2], // +Y
            [0, 1, 5, 4], // -Y
        ];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for face in FACES {
            let base = vertices.len() as u32;
            vertices.extend(face.iter().zip(FACE_UVS).map(|(&c, uv)| MeshVertex::new(corner(c), uv)));
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[MeshVertex]) -> Self {
        if vertices.is_empty() {
            return Self { min: Vec3::ZERO, max: Vec3::ZERO };
        }
        vertices.iter().map(|v| Vec3::from_array(v.position)).fold(
            Self { min: Vec3::splat(f32::INFINITY), max: Vec3::splat(f32::NEG_INFINITY) },
            |acc, p| Self { min: acc.min.min(p), max: acc.max.max(p) },
        )
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { a.x } else { b.x },
                if i & 2 == 0 { a.y } else { b.y },
                if i & 4 == 0 { a.z } else { b.z },
            )
        })
    }

    /// World-space axis-aligned `(min, max)` of these bounds placed by `world`.
    pub fn transformed(&self, world: &Mat4) -> (Vec3, Vec3) {
        self.corners().iter().map(|&c| world.transform_point3(c)).fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), p| (min.min(p), max.max(p)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_bounds_are_flat() {
        let quad = Mesh::quad(2.0);
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices.len(), 6);
        assert_eq!(quad.bounds.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(quad.bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn cube_has_six_uv_mapped_faces() {
        let cube = Mesh::cube(1.0);
        assert_eq!((cube.vertices.len(), cube.indices.len()), (24, 36));
        assert_eq!(cube.bounds, MeshBounds { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) });
        assert!(cube.indices.iter().all(|&i| (i as usize) < cube.vertices.len()));
    }

    #[test]
    fn transformed_bounds_follow_translation() {
        let cube = Mesh::cube(1.0);
        let (min, max) = cube.bounds.transformed(&Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)));
        assert!((min - Vec3::new(2.5, -0.5, -0.5)).length() < 1e-5);
        assert!((max - Vec3::new(3.5, 0.5, 0.5)).length() < 1e-5);
    }
}
