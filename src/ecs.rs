mod transform;
mod types;
mod world;

pub mod systems;

pub use transform::*;
pub use types::*;
pub use world::*;
