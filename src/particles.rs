mod curve;
mod render_config;
mod sub_uv;
mod system;

pub use curve::{ColorGradient, CurveKey, GradientKey, MinMaxCurve};
pub use render_config::{AnimationType, RenderConfig, RenderMode, TextureSheetAnimation};
pub use sub_uv::{lifetime_progress, try_lifetime_progress, SubUvFrameInfo};
pub use system::{
    EmitterSettings, LifetimeModules, MainModule, Particle, ParticleSystem, SimulationSpace, TextureSheetSettings,
};
