pub mod app;
pub mod bounds;
pub mod camera3d;
pub mod cli;
pub mod config;
pub mod ecs;
pub mod error;
pub mod events;
pub mod mesh;
pub mod mesh_registry;
pub mod particles;
pub mod pixel_sampler;
pub mod probe;
pub mod texture;

pub use app::{run, run_with_config, App, DemoSummary};
pub use error::{ProbeError, ProbeResult};
