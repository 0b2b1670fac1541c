//! Freezing particle emitters into pickable proxy objects.

mod helper;
mod proxy;
mod system_collider;

pub use helper::CollisionHelper;
pub use hit_test::{passes_alpha_cutoff, resolve_pointer_hit, uv_to_pixel, HitOutcome, ProxyHit};
pub use proxy::{ParticleProxy, ParticleSnapshot};
pub use system_collider::{ParticleSystemCollider, ProxyTemplate};
