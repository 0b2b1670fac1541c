use crate::particles::{AnimationType, RenderMode};
use bevy_ecs::prelude::Entity;
use thiserror::Error;

/// Failures raised while reconstructing proxies or resolving a pointer hit.
///
/// None of these are fatal to a tick: callers log them and carry on with the
/// remaining proxies or fall back to a coarse hit report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("Unsupported render mode: {0:?}")]
    UnsupportedRenderMode(RenderMode),

    #[error("Unsupported texture sheet animation type: {0:?}")]
    UnsupportedAnimationType(AnimationType),

    #[error("Hit proxy has no render surface for pixel testing: {0}")]
    MissingRenderSurface(&'static str),

    #[error("Particle start lifetime is zero")]
    DegenerateLifetime,

    #[error("Texture '{0}' is not registered")]
    UnknownTexture(String),

    #[error("Texture '{0}' does not allow direct pixel read-back")]
    TextureNotReadable(String),

    #[error("Texture has no texels ({width}x{height})")]
    EmptyTexture { width: u32, height: u32 },

    #[error("Mesh '{0}' is not registered")]
    UnknownMesh(String),

    #[error("Entity {0:?} does not exist or lacks the required components")]
    MissingEntity(Entity),
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
