use super::curve::{ColorGradient, MinMaxCurve};
use super::render_config::{AnimationType, RenderConfig, RenderMode, TextureSheetAnimation};
use super::sub_uv::lifetime_progress;
use crate::ecs::Material;
use bevy_ecs::prelude::Component;
use glam::{Mat4, Vec3, Vec4};
use rand::Rng;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationSpace {
    #[default]
    Local,
    World,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MainModule {
    pub simulation_space: SimulationSpace,
    pub start_lifetime: f32,
    pub start_speed: f32,
    pub start_size: Vec3,
    /// Degrees.
    pub start_rotation: Vec3,
    /// Degrees per second.
    pub rotation_speed: Vec3,
    pub start_color: Vec4,
    pub emission_rate: f32,
    pub max_particles: usize,
}

impl Default for MainModule {
    fn default() -> Self {
        Self {
            simulation_space: SimulationSpace::Local,
            start_lifetime: 5.0,
            start_speed: 1.0,
            start_size: Vec3::ONE,
            start_rotation: Vec3::ZERO,
            rotation_speed: Vec3::ZERO,
            start_color: Vec4::ONE,
            emission_rate: 10.0,
            max_particles: 1000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LifetimeModules {
    pub size_over_lifetime: Option<MinMaxCurve>,
    pub color_over_lifetime: Option<ColorGradient>,
}

impl LifetimeModules {
    pub fn size3d(&self, start_size: Vec3, progress: f32) -> Vec3 {
        match &self.size_over_lifetime {
            Some(curve) => start_size * curve.evaluate(progress),
            None => start_size,
        }
    }

    pub fn color(&self, start_color: Vec4, progress: f32) -> Vec4 {
        match &self.color_over_lifetime {
            Some(gradient) => start_color * gradient.evaluate(progress),
            None => start_color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Emitter-local or world position depending on the simulation space.
    pub position: Vec3,
    pub velocity: Vec3,
    /// Degrees.
    pub rotation: Vec3,
    /// Degrees per second.
    pub angular_velocity: Vec3,
    pub start_size: Vec3,
    pub start_color: Vec4,
    pub start_lifetime: f32,
    pub remaining_lifetime: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            start_size: Vec3::ONE,
            start_color: Vec4::ONE,
            start_lifetime: 1.0,
            remaining_lifetime: 1.0,
        }
    }
}

impl Particle {
    pub fn progress(&self) -> f32 {
        lifetime_progress(self.start_lifetime, self.remaining_lifetime)
    }

    pub fn current_size3d(&self, modules: &LifetimeModules) -> Vec3 {
        modules.size3d(self.start_size, self.progress())
    }

    pub fn current_size(&self, modules: &LifetimeModules) -> f32 {
        self.current_size3d(modules).x
    }

    pub fn current_color(&self, modules: &LifetimeModules) -> Vec4 {
        modules.color(self.start_color, self.progress())
    }
}

/// A live particle emitter attached to a scene object.
#[derive(Component, Clone, Debug)]
pub struct ParticleSystem {
    pub name: String,
    pub main: MainModule,
    pub lifetime: LifetimeModules,
    pub texture_sheet: TextureSheetAnimation,
    pub renderer: RenderConfig,
    particles: Vec<Particle>,
    paused: bool,
    accumulator: f32,
}

impl ParticleSystem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            main: MainModule::default(),
            lifetime: LifetimeModules::default(),
            texture_sheet: TextureSheetAnimation::default(),
            renderer: RenderConfig::default(),
            particles: Vec::new(),
            paused: false,
            accumulator: 0.0,
        }
    }

    pub fn from_settings(settings: &EmitterSettings) -> Self {
        let mut system = Self::new(settings.name.clone());
        system.main = MainModule {
            simulation_space: settings.simulation_space,
            start_lifetime: settings.start_lifetime,
            start_speed: settings.start_speed,
            start_size: Vec3::from_array(settings.start_size),
            start_rotation: Vec3::from_array(settings.start_rotation),
            rotation_speed: Vec3::from_array(settings.rotation_speed),
            start_color: Vec4::from_array(settings.start_color),
            emission_rate: settings.emission_rate,
            max_particles: settings.max_particles,
        };
        system.lifetime = LifetimeModules {
            size_over_lifetime: settings.size_over_lifetime.clone(),
            color_over_lifetime: settings.color_over_lifetime.clone(),
        };
        if let Some(sheet) = &settings.texture_sheet {
            system.texture_sheet = TextureSheetAnimation {
                enabled: true,
                tiles_x: sheet.tiles_x,
                tiles_y: sheet.tiles_y,
                animation: sheet.animation,
                start_frame: sheet.start_frame.clone().unwrap_or(MinMaxCurve::constant(0.0)),
                frame_over_time: sheet.frame_over_time.clone().unwrap_or(MinMaxCurve::linear(0.0, 1.0)),
            };
        }
        let mut material = Material { key: format!("{}::material", settings.name), ..Default::default() };
        material.main_texture = settings.texture.clone();
        material.color = Vec4::from_array(settings.tint);
        system.renderer = RenderConfig {
            render_mode: settings.render_mode,
            pivot: Vec3::from_array(settings.pivot),
            material,
            mesh: settings.mesh.clone(),
        };
        system
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn set_particles(&mut self, particles: Vec<Particle>) {
        self.particles = particles;
    }

    pub fn emit(&mut self, particle: Particle) {
        if self.particles.len() < self.main.max_particles {
            self.particles.push(particle);
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.accumulator = 0.0;
    }

    /// Freezes the simulation. Child emitters are paused by whoever walks the hierarchy,
    /// so `with_children` only documents intent here.
    pub fn pause(&mut self, with_children: bool) {
        log::trace!("pausing '{}' (with_children={with_children})", self.name);
        self.paused = true;
    }

    pub fn play(&mut self, with_children: bool) {
        log::trace!("resuming '{}' (with_children={with_children})", self.name);
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advances the simulation by `dt` seconds. `emitter_world` places newly spawned
    /// world-space particles; local-space particles are born at the emitter origin.
    pub fn simulate<R: Rng + ?Sized>(&mut self, dt: f32, emitter_world: &Mat4, rng: &mut R) {
        if self.paused || dt <= 0.0 {
            return;
        }

        self.particles.retain_mut(|particle| {
            particle.remaining_lifetime -= dt;
            if particle.remaining_lifetime <= 0.0 {
                return false;
            }
            particle.position += particle.velocity * dt;
            particle.rotation += particle.angular_velocity * dt;
            true
        });

        let rate = self.main.emission_rate.max(0.0);
        self.accumulator += rate * dt;
        let desired = self.accumulator.floor() as usize;
        if desired == 0 {
            return;
        }
        self.accumulator -= desired as f32;
        let headroom = self.main.max_particles.saturating_sub(self.particles.len());
        let to_spawn = desired.min(headroom);
        for _ in 0..to_spawn {
            let dir = random_unit_vector(rng);
            let (position, velocity) = match self.main.simulation_space {
                SimulationSpace::Local => (Vec3::ZERO, dir * self.main.start_speed),
                SimulationSpace::World => (
                    emitter_world.transform_point3(Vec3::ZERO),
                    emitter_world.transform_vector3(dir).normalize_or_zero() * self.main.start_speed,
                ),
            };
            let lifetime = self.main.start_lifetime.max(0.0);
            self.particles.push(Particle {
                position,
                velocity,
                rotation: self.main.start_rotation,
                angular_velocity: self.main.rotation_speed,
                start_size: self.main.start_size,
                start_color: self.main.start_color,
                start_lifetime: lifetime,
                remaining_lifetime: lifetime,
            });
        }
    }
}

fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = rng.gen_range(0.0..std::f32::consts::TAU);
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

#[derive(Clone, Debug, Deserialize)]
pub struct TextureSheetSettings {
    pub tiles_x: u32,
    pub tiles_y: u32,
    #[serde(default)]
    pub animation: AnimationType,
    #[serde(default)]
    pub start_frame: Option<MinMaxCurve>,
    #[serde(default)]
    pub frame_over_time: Option<MinMaxCurve>,
}

/// Declarative emitter description, as found in the app config.
#[derive(Clone, Debug, Deserialize)]
pub struct EmitterSettings {
    pub name: String,
    #[serde(default)]
    pub simulation_space: SimulationSpace,
    #[serde(default = "EmitterSettings::default_start_lifetime")]
    pub start_lifetime: f32,
    #[serde(default = "EmitterSettings::default_start_speed")]
    pub start_speed: f32,
    #[serde(default = "EmitterSettings::default_ones3")]
    pub start_size: [f32; 3],
    #[serde(default)]
    pub start_rotation: [f32; 3],
    #[serde(default)]
    pub rotation_speed: [f32; 3],
    #[serde(default = "EmitterSettings::default_ones4")]
    pub start_color: [f32; 4],
    #[serde(default = "EmitterSettings::default_emission_rate")]
    pub emission_rate: f32,
    #[serde(default = "EmitterSettings::default_max_particles")]
    pub max_particles: usize,
    #[serde(default)]
    pub size_over_lifetime: Option<MinMaxCurve>,
    #[serde(default)]
    pub color_over_lifetime: Option<ColorGradient>,
    #[serde(default)]
    pub render_mode: RenderMode,
    #[serde(default)]
    pub pivot: [f32; 3],
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default = "EmitterSettings::default_ones4")]
    pub tint: [f32; 4],
    #[serde(default)]
    pub mesh: Option<String>,
    #[serde(default)]
    pub texture_sheet: Option<TextureSheetSettings>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "EmitterSettings::default_ones3")]
    pub scale: [f32; 3],
}

impl EmitterSettings {
    fn default_start_lifetime() -> f32 {
        5.0
    }

    fn default_start_speed() -> f32 {
        1.0
    }

    fn default_emission_rate() -> f32 {
        10.0
    }

    const fn default_max_particles() -> usize {
        1000
    }

    fn default_ones3() -> [f32; 3] {
        [1.0; 3]
    }

    fn default_ones4() -> [f32; 4] {
        [1.0; 4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn paused_system_does_not_advance() {
        let mut system = ParticleSystem::new("paused");
        system.emit(Particle { remaining_lifetime: 0.5, start_lifetime: 1.0, ..Default::default() });
        system.pause(true);
        let mut rng = StdRng::seed_from_u64(7);
        system.simulate(10.0, &Mat4::IDENTITY, &mut rng);
        assert_eq!(system.particle_count(), 1);
        assert!((system.particles()[0].remaining_lifetime - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn simulation_spawns_and_expires_particles() {
        let mut system = ParticleSystem::new("burst");
        system.main.emission_rate = 10.0;
        system.main.start_lifetime = 1.0;
        let mut rng = StdRng::seed_from_u64(3);
        system.simulate(0.5, &Mat4::IDENTITY, &mut rng);
        assert_eq!(system.particle_count(), 5);
        system.main.emission_rate = 0.0;
        system.simulate(1.1, &Mat4::IDENTITY, &mut rng);
        assert_eq!(system.particle_count(), 0, "all particles outlived their lifetime");
    }

    #[test]
    fn spawn_respects_max_particles() {
        let mut system = ParticleSystem::new("capped");
        system.main.emission_rate = 100.0;
        system.main.max_particles = 4;
        let mut rng = StdRng::seed_from_u64(11);
        system.simulate(1.0, &Mat4::IDENTITY, &mut rng);
        assert_eq!(system.particle_count(), 4);
    }

    #[test]
    fn world_space_particles_spawn_at_emitter() {
        let mut system = ParticleSystem::new("world");
        system.main.simulation_space = SimulationSpace::World;
        system.main.emission_rate = 1.0;
        let mut rng = StdRng::seed_from_u64(5);
        let emitter = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        system.simulate(1.0, &emitter, &mut rng);
        assert_eq!(system.particles()[0].position, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn current_size_and_color_follow_lifetime_modules() {
        let modules = LifetimeModules {
            size_over_lifetime: Some(MinMaxCurve::linear(1.0, 0.0)),
            color_over_lifetime: Some(ColorGradient::new(Vec4::ONE, Vec4::new(1.0, 0.0, 0.0, 0.0))),
        };
        let particle = Particle {
            start_size: Vec3::new(2.0, 4.0, 6.0),
            start_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            start_lifetime: 2.0,
            remaining_lifetime: 1.0,
            ..Default::default()
        };
        assert!((particle.current_size3d(&modules) - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((particle.current_size(&modules) - 1.0).abs() < 1e-6);
        let color = particle.current_color(&modules);
        assert!((color - Vec4::new(0.5, 0.25, 0.25, 0.5)).length() < 1e-6, "color was {color:?}");
    }

    #[test]
    fn settings_build_a_sheet_animated_system() {
        let settings: EmitterSettings = serde_json::from_str(
            r#"{
                "name": "sparks",
                "simulation_space": "world",
                "render_mode": "mesh",
                "mesh": "cube",
                "texture": "sheet",
                "tint": [1.0, 0.5, 0.5, 1.0],
                "texture_sheet": { "tiles_x": 4, "tiles_y": 2 }
            }"#,
        )
        .expect("settings json");
        let system = ParticleSystem::from_settings(&settings);
        assert_eq!(system.main.simulation_space, SimulationSpace::World);
        assert_eq!(system.renderer.render_mode, RenderMode::Mesh);
        assert_eq!(system.renderer.mesh.as_deref(), Some("cube"));
        assert_eq!(system.renderer.material.main_texture.as_deref(), Some("sheet"));
        assert!(system.texture_sheet.enabled);
        assert_eq!((system.texture_sheet.columns(), system.texture_sheet.rows()), (4, 2));
    }
}
