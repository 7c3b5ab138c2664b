//! # fbosim - texture-state GPU particle simulations
//!
//! Particle state lives entirely on the GPU: an N x N `rgba32float` texture
//! holds one particle per texel as `(position.xyz, time_alive)`, and a
//! generated compute shader advances every texel each frame against a
//! ping-pong copy of the texture. The host never touches per-particle data
//! after setup - it only advances a spawn cursor and uploads a uniform
//! block.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fbosim::prelude::*;
//!
//! fn main() -> Result<(), SystemError> {
//!     let gpu = GpuContext::new()?;
//!
//!     let positions = (0..4096)
//!         .map(|i| {
//!             let a = i as f32 / 4096.0 * std::f32::consts::TAU;
//!             Vec3::new(a.cos(), 0.0, a.sin())
//!         })
//!         .collect();
//!
//!     let mut system = SystemBuilder::new()
//!         .with_emitter(EmitterData::from_positions(positions))
//!         .with_spawn_rate(500.0)
//!         .with_life_range(1.0, 3.0)
//!         .with_speed_range(0.5, 1.5)
//!         .with_force(ForceDescriptor::Directional {
//!             directions: vec![Vec3::Y],
//!             mode: DirectionMode::Constant,
//!             random_spread: 0.15,
//!             strength: 1.0,
//!         })
//!         .with_force(ForceDescriptor::Noise {
//!             axes: AxisMask::Xyz,
//!             seed: Vec3::new(31.0, 517.0, 88.0),
//!             period: Vec3::splat(2.0),
//!             strength: 0.4,
//!         })
//!         .build(&gpu)?;
//!
//!     let mut clock = FrameClock::new();
//!     loop {
//!         let (_, delta) = clock.update();
//!         system.step(delta);
//!         // sample system.state_view() from your renderer
//!     }
//! }
//! ```
//!
//! ## Core concepts
//!
//! ### Slots, not particles
//!
//! The system owns a fixed pool of slots. A slot is dormant
//! (`time_alive < 0`) until the spawn cursor sweeps past it, then lives for
//! its baked lifetime, then resets to its spawn position and goes dormant
//! again. Nothing is allocated or freed after build; spawning is a ring
//! cursor advancing `floor(spawn_rate * dt)` slots per frame.
//!
//! ### Compiled force variants
//!
//! The force set is fixed when the system is built: each active force bakes
//! its WGSL block into the compute program, so the per-texel loop has no
//! branching over disabled forces. Numeric parameters stay in a uniform
//! block and can change every frame ([`ParticleSystem::set_force`]);
//! enabling or disabling a force kind means building a new system.
//!
//! ### Bring your own renderer
//!
//! This crate only simulates. The renderer samples
//! [`ParticleSystem::state_view`] in its vertex stage, one texel per
//! particle via [`SlotGrid::uv`], and draws however it likes.

pub mod buffers;
pub mod emitter;
pub mod error;
pub mod forces;
pub mod gpu;
pub mod lifecycle;
pub mod scheduler;
pub mod shader;
pub mod shader_utils;
pub mod simulation;
pub mod time;
pub mod uniforms;

pub use buffers::{SlotBuffers, SlotGrid};
pub use emitter::{DirectionSeeds, EmitterData, SeedSource};
pub use error::{ConfigError, GpuError, SystemError};
pub use forces::{
    AxisMask, DirectionMode, ForceDescriptor, ForceKind, ForceSet, Polarity, ReturnForce,
    RotationPlane, MAX_DIRECTIONS,
};
pub use glam::{Mat4, Vec3, Vec4};
pub use gpu::{GpuContext, StateTexturePair};
pub use lifecycle::{SlotPhase, DORMANT, MAX_DELTA};
pub use scheduler::{SpawnRange, SpawnScheduler};
pub use shader::SimulationSpace;
pub use simulation::{ParticleSystem, SystemBuilder};
pub use time::FrameClock;

/// Common imports for building and driving a system.
pub mod prelude {
    pub use crate::emitter::{DirectionSeeds, EmitterData, SeedSource};
    pub use crate::error::SystemError;
    pub use crate::forces::{
        AxisMask, DirectionMode, ForceDescriptor, Polarity, ReturnForce, RotationPlane,
    };
    pub use crate::gpu::GpuContext;
    pub use crate::shader::SimulationSpace;
    pub use crate::simulation::{ParticleSystem, SystemBuilder};
    pub use crate::time::FrameClock;
    pub use crate::{Mat4, Vec3, Vec4};
}
