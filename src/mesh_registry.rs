use std::collections::HashMap;

use bevy_ecs::prelude::Resource;

use crate::error::{ProbeError, ProbeResult};
use crate::mesh::{Mesh, MeshBounds};

pub const QUAD_MESH: &str = "quad";
pub const CUBE_MESH: &str = "cube";

#[derive(Resource)]
pub struct MeshRegistry {
    entries: HashMap<String, Mesh>,
    default: String,
}

impl Default for MeshRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshRegistry {
    pub fn new() -> Self {
        let mut registry = MeshRegistry { entries: HashMap::new(), default: QUAD_MESH.to_string() };
        registry.insert(QUAD_MESH, Mesh::quad(1.0));
        registry.insert(CUBE_MESH, Mesh::cube(1.0));
        registry
    }

    pub fn insert(&mut self, key: impl Into<String>, mesh: Mesh) {
        self.entries.insert(key.into(), mesh);
    }

    pub fn default_key(&self) -> &str {
        &self.default
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Mesh> {
        self.entries.get(key)
    }

    pub fn require(&self, key: &str) -> ProbeResult<&Mesh> {
        self.entries.get(key).ok_or_else(|| ProbeError::UnknownMesh(key.to_string()))
    }

    pub fn mesh_bounds(&self, key: &str) -> Option<&MeshBounds> {
        self.entries.get(key).map(|mesh| &mesh.bounds)
    }
}
