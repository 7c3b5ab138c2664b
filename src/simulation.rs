//! System assembly and the frame loop.
//!
//! [`SystemBuilder`] collects the emitter data, ranges, and force set, then
//! [`SystemBuilder::build`] bakes the slot buffers, compiles the program
//! variant for the active forces, and uploads everything to the GPU.
//!
//! The resulting [`ParticleSystem`] is driven by [`ParticleSystem::step`]
//! once per frame. Rendering is the caller's: sample
//! [`ParticleSystem::state_view`] with the per-slot UVs from
//! [`ParticleSystem::grid`].
//!
//! # Example
//!
//! ```ignore
//! let gpu = GpuContext::new()?;
//! let mut system = SystemBuilder::new()
//!     .with_emitter(EmitterData::from_positions(positions))
//!     .with_spawn_rate(200.0)
//!     .with_life_range(1.0, 3.0)
//!     .with_speed_range(0.5, 1.5)
//!     .with_force(ForceDescriptor::Directional {
//!         directions: vec![Vec3::Y],
//!         mode: DirectionMode::Constant,
//!         random_spread: 0.15,
//!         strength: 1.0,
//!     })
//!     .build(&gpu)?;
//!
//! system.step(clock.update().1);
//! ```

use glam::Mat4;

use crate::buffers::{SlotBuffers, SlotGrid};
use crate::emitter::EmitterData;
use crate::error::{ConfigError, GpuError, SystemError};
use crate::forces::{ForceDescriptor, ForceSet};
use crate::gpu::{self, GpuContext, SimulationPass, StateTexturePair};
use crate::lifecycle::MAX_DELTA;
use crate::scheduler::SpawnScheduler;
use crate::shader::{generate_simulation_shader, program_key, SimulationSpace};
use crate::uniforms::{self, FrameParams};

/// Builder for a [`ParticleSystem`].
#[derive(Clone, Debug, Default)]
pub struct SystemBuilder {
    emitter: EmitterData,
    spawn_rate: f32,
    life_range: Option<(f32, f32)>,
    speed_range: Option<(f32, f32)>,
    space: SimulationSpace,
    normalize_forces: bool,
    forces: ForceSet,
    rng_seed: Option<u64>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-slot spawn data. The position count fixes the slot count and must
    /// be a perfect square.
    pub fn with_emitter(mut self, emitter: EmitterData) -> Self {
        self.emitter = emitter;
        self
    }

    /// Continuous spawn rate in particles per second. Defaults to zero
    /// (only [`ParticleSystem::burst`] spawns anything).
    pub fn with_spawn_rate(mut self, rate: f32) -> Self {
        self.spawn_rate = rate.max(0.0);
        self
    }

    /// Per-slot lifetime range in seconds, sampled once at build time.
    /// Defaults to one second for every slot.
    pub fn with_life_range(mut self, min: f32, max: f32) -> Self {
        self.life_range = Some((min, max));
        self
    }

    /// Per-slot speed range, resolved by each slot's first random. May be
    /// changed later with [`ParticleSystem::set_speed_range`]. Defaults to
    /// a constant speed of one.
    pub fn with_speed_range(mut self, min: f32, max: f32) -> Self {
        self.speed_range = Some((min, max));
        self
    }

    /// Simulate in local or world space. World space pushes spawn positions
    /// through the model matrix, so live particles trail a moving emitter.
    pub fn with_space(mut self, space: SimulationSpace) -> Self {
        self.space = space;
        self
    }

    /// Normalize the accumulated force direction before integration, making
    /// speed come entirely from the speed range.
    pub fn with_normalize_forces(mut self, normalize: bool) -> Self {
        self.normalize_forces = normalize;
        self
    }

    /// Add a force, replacing any earlier one of the same kind.
    pub fn with_force(mut self, force: ForceDescriptor) -> Self {
        self.forces.add(force);
        self
    }

    /// Pin the build-time RNG (lifetimes, randoms, seed jitter) for
    /// reproducible systems.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Check the configuration without touching the GPU. Everything
    /// `build` can reject is caught here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.emitter.validate()?;
        let (min, max) = self.speed_range.unwrap_or((1.0, 1.0));
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ConfigError::InvalidRange {
                name: "speed",
                min,
                max,
            });
        }
        let (min, max) = self.life_range.unwrap_or((1.0, 1.0));
        if !min.is_finite() || !max.is_finite() || min > max || min < 0.0 {
            return Err(ConfigError::InvalidRange {
                name: "life",
                min,
                max,
            });
        }
        Ok(())
    }

    /// Bake the buffers, compile the program variant, upload, and return a
    /// ready system.
    pub fn build(self, gpu: &GpuContext) -> Result<ParticleSystem, SystemError> {
        self.validate()?;
        let life_range = self.life_range.unwrap_or((1.0, 1.0));
        let speed_range = self.speed_range.unwrap_or((1.0, 1.0));

        let buffers = SlotBuffers::build(&self.emitter, life_range, self.rng_seed)?;
        let grid = buffers.grid;

        // Forces that need seeds the emitter does not carry are dropped here
        // with a warning, before the variant key is fixed.
        let mut forces = self.forces;
        forces.retain_supported(buffers.seed_source);

        let key = program_key(&forces, self.space, self.normalize_forces);
        let source = generate_simulation_shader(&forces, self.space, self.normalize_forces);
        log::debug!(
            "compiling simulation program '{}' for {} slots ({}x{})",
            key,
            grid.slot_count(),
            grid.side(),
            grid.side()
        );

        let spawn_tex = gpu::create_data_texture(gpu, "spawn records", grid, &buffers.spawn_records);
        let rand_tex = gpu::create_data_texture(gpu, "random records", grid, &buffers.random_records);
        let seed_tex = gpu::create_data_texture(gpu, "direction seeds", grid, &buffers.direction_seeds);

        let state = StateTexturePair::new(gpu, grid, &buffers.initial_state);
        let pass = SimulationPass::new(
            gpu,
            grid,
            &source,
            &state,
            &spawn_tex.create_view(&Default::default()),
            &rand_tex.create_view(&Default::default()),
            &seed_tex.create_view(&Default::default()),
        );

        Ok(ParticleSystem {
            gpu: gpu.clone(),
            grid,
            scheduler: SpawnScheduler::new(grid.slot_count(), self.spawn_rate),
            forces,
            space: self.space,
            normalize_forces: self.normalize_forces,
            program_key: key,
            pass,
            state,
            model: Mat4::IDENTITY,
            speed_range,
            active_time: 0.0,
            paused: false,
        })
    }
}

/// A running texture-state particle system.
pub struct ParticleSystem {
    gpu: GpuContext,
    grid: SlotGrid,
    scheduler: SpawnScheduler,
    forces: ForceSet,
    space: SimulationSpace,
    normalize_forces: bool,
    program_key: String,
    pass: SimulationPass,
    state: StateTexturePair,
    model: Mat4,
    speed_range: (f32, f32),
    active_time: f32,
    paused: bool,
}

impl ParticleSystem {
    /// The slot grid, for mapping slots to state-texture texels.
    pub fn grid(&self) -> SlotGrid {
        self.grid
    }

    /// Total slot count.
    pub fn slot_count(&self) -> u32 {
        self.grid.slot_count()
    }

    /// Name of the compiled program variant.
    pub fn program_key(&self) -> &str {
        &self.program_key
    }

    /// Advance the simulation one frame.
    ///
    /// Skips entirely while paused, on non-positive deltas, and on deltas
    /// above the stall threshold (a backgrounded window reporting a huge
    /// catch-up delta would otherwise teleport every particle).
    pub fn step(&mut self, delta: f32) {
        if self.paused || delta <= 0.0 {
            return;
        }
        if delta > MAX_DELTA {
            log::warn!(
                "skipping simulation step: delta {:.2}s exceeds the {:.0}s stall threshold",
                delta,
                MAX_DELTA
            );
            return;
        }

        let range = self.scheduler.step(delta);
        self.active_time += delta;

        let frame = FrameParams {
            delta,
            time: self.active_time,
            model: self.model,
            previous_cursor: range.previous_cursor,
            spawn_span: range.span,
            speed_range: self.speed_range,
        };
        let u = uniforms::pack(&frame, &self.forces);
        self.pass.dispatch(&self.gpu, &mut self.state, &u);
    }

    /// Queue `count` immediate activations on top of the continuous rate.
    /// Applied by the next [`ParticleSystem::step`].
    pub fn burst(&mut self, count: u32) {
        self.scheduler.burst(count);
    }

    /// Stop stepping; state and cursor hold until [`ParticleSystem::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the system is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds of unpaused simulation time.
    pub fn active_time(&self) -> f32 {
        self.active_time
    }

    /// Current spawn cursor position.
    pub fn spawn_cursor(&self) -> u32 {
        self.scheduler.cursor()
    }

    /// Change the continuous spawn rate.
    pub fn set_spawn_rate(&mut self, rate: f32) {
        self.scheduler.set_spawn_rate(rate);
    }

    /// Change the per-slot speed range.
    pub fn set_speed_range(&mut self, min: f32, max: f32) {
        self.speed_range = (min, max);
    }

    /// Set the model matrix used by world-space simulation. No effect on the
    /// compiled program in local space.
    pub fn set_model_matrix(&mut self, model: Mat4) {
        self.model = model;
    }

    /// Update a force's numeric parameters.
    ///
    /// Only changes that keep the compiled program valid are accepted:
    /// strengths, centers, seeds, radii. Adding a force kind, removing one,
    /// or changing a structural field (axis mask, direction count, mode)
    /// would need a different program; such updates are rejected with a
    /// warning and `false`.
    pub fn set_force(&mut self, force: ForceDescriptor) -> bool {
        let mut candidate = self.forces.clone();
        candidate.add(force);
        let key = program_key(&candidate, self.space, self.normalize_forces);
        if key != self.program_key {
            log::warn!(
                "force update rejected: it would change the compiled program ('{}' -> '{}'); rebuild the system instead",
                self.program_key,
                key
            );
            return false;
        }
        self.forces = candidate;
        true
    }

    /// Texture holding the latest particle state, for renderer bind groups.
    pub fn state_texture(&self) -> &wgpu::Texture {
        self.state.current_texture()
    }

    /// View of the latest particle state, for renderer bind groups.
    pub fn state_view(&self) -> &wgpu::TextureView {
        self.state.current_view()
    }

    /// Read the current state back to the CPU as `(x, y, z, time_alive)`
    /// quadruples in slot order. Blocking; debug and test path.
    pub fn read_state(&self) -> Result<Vec<f32>, GpuError> {
        gpu::read_state_texture(&self.gpu, self.state.current_texture(), self.grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::{AxisMask, DirectionMode};
    use glam::Vec3;

    fn builder() -> SystemBuilder {
        SystemBuilder::new()
            .with_emitter(EmitterData::from_positions(vec![Vec3::ZERO; 16]))
            .with_spawn_rate(16.0)
            .with_life_range(1.0, 2.0)
    }

    #[test]
    fn test_validate_catches_bad_emitter() {
        let b = SystemBuilder::new();
        assert_eq!(b.validate(), Err(ConfigError::EmptySystem));

        let b = SystemBuilder::new()
            .with_emitter(EmitterData::from_positions(vec![Vec3::ZERO; 10]));
        assert_eq!(b.validate(), Err(ConfigError::NotSquare(10)));
    }

    #[test]
    fn test_validate_catches_bad_speed_range() {
        let b = builder().with_speed_range(2.0, 1.0);
        assert!(matches!(
            b.validate(),
            Err(ConfigError::InvalidRange { name: "speed", .. })
        ));
        assert!(builder().with_speed_range(0.5, 1.5).validate().is_ok());
    }

    #[test]
    fn test_validate_catches_bad_life_range() {
        // validate must reject everything build would, including the life
        // range that the buffer baking checks
        let b = builder().with_life_range(3.0, 1.0);
        assert!(matches!(
            b.validate(),
            Err(ConfigError::InvalidRange { name: "life", .. })
        ));
        let b = builder().with_life_range(-1.0, 1.0);
        assert!(matches!(
            b.validate(),
            Err(ConfigError::InvalidRange { name: "life", .. })
        ));
    }

    #[test]
    fn test_builder_replaces_same_force_kind() {
        let b = builder()
            .with_force(ForceDescriptor::Noise {
                axes: AxisMask::Xyz,
                seed: Vec3::ZERO,
                period: Vec3::ONE,
                strength: 1.0,
            })
            .with_force(ForceDescriptor::Noise {
                axes: AxisMask::Xz,
                seed: Vec3::ZERO,
                period: Vec3::ONE,
                strength: 2.0,
            });
        assert_eq!(b.forces.len(), 1);
        assert_eq!(b.forces.variant_key(), "noise-xz");
    }

    #[test]
    fn test_builder_variant_key_reflects_configuration() {
        let b = builder()
            .with_normalize_forces(true)
            .with_space(SimulationSpace::World)
            .with_force(ForceDescriptor::Directional {
                directions: vec![Vec3::Y],
                mode: DirectionMode::Constant,
                random_spread: 0.1,
                strength: 1.0,
            });
        let key = program_key(&b.forces, b.space, b.normalize_forces);
        assert_eq!(key, "dir-const-1+world+norm");
    }
}
