//! Slot grid addressing and the per-slot data buffers.
//!
//! Particle state lives in square `rgba32float` textures, one texel per slot.
//! [`SlotGrid`] owns the slot <-> texel <-> uv mapping; rendering code uses
//! the same mapping to fetch each particle's state, so it must stay stable
//! for the lifetime of the system.
//!
//! [`SlotBuffers::build`] bakes the emitter data into the four flat `f32`
//! buffers the GPU textures are uploaded from. Everything random (lifetimes,
//! the per-slot random records, seed jitter) is drawn here, once, on the CPU;
//! the simulation itself is deterministic given these buffers.

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::emitter::{EmitterData, SeedSource};
use crate::error::ConfigError;
use crate::lifecycle::DORMANT;

/// Square texel grid holding one slot per texel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotGrid {
    side: u32,
}

impl SlotGrid {
    /// Build a grid for `slot_count` slots. Fails unless the count is a
    /// positive perfect square.
    pub fn from_slot_count(slot_count: u32) -> Result<Self, ConfigError> {
        if slot_count == 0 {
            return Err(ConfigError::EmptySystem);
        }
        let side = (slot_count as f64).sqrt() as u32;
        if side * side != slot_count {
            return Err(ConfigError::NotSquare(slot_count));
        }
        Ok(Self { side })
    }

    /// Texture side length N.
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total slot count N squared.
    pub fn slot_count(&self) -> u32 {
        self.side * self.side
    }

    /// Texel coordinate of a slot.
    pub fn texel(&self, slot: u32) -> (u32, u32) {
        (slot % self.side, slot / self.side)
    }

    /// Slot index of a texel.
    pub fn slot(&self, x: u32, y: u32) -> u32 {
        y * self.side + x
    }

    /// Texel-center UV of a slot, for samplers that read the state texture.
    pub fn uv(&self, slot: u32) -> (f32, f32) {
        let (x, y) = self.texel(slot);
        let side = self.side as f32;
        ((x as f32 + 0.5) / side, (y as f32 + 0.5) / side)
    }
}

/// The CPU-built per-slot buffers, each `4 * slot_count` floats in texel
/// order, ready for texture upload.
#[derive(Debug)]
pub struct SlotBuffers {
    /// Grid the buffers are laid out on.
    pub grid: SlotGrid,
    /// `(spawn_position.xyz, DORMANT)` per slot: the first state texture.
    pub initial_state: Vec<f32>,
    /// `(spawn_position.xyz, max_life)` per slot, immutable.
    pub spawn_records: Vec<f32>,
    /// Four uniform floats in `[0, 1)` per slot, immutable.
    pub random_records: Vec<f32>,
    /// `(seed_direction.xyz, 0)` per slot; all zeros when the emitter has no
    /// seeds. Always uploaded so the bind group layout is constant.
    pub direction_seeds: Vec<f32>,
    /// Source of the seed directions, if any.
    pub seed_source: Option<SeedSource>,
}

impl SlotBuffers {
    /// Bake emitter data into upload-ready buffers.
    ///
    /// `life_range` supplies per-slot lifetimes where the emitter does not
    /// carry explicit ones. `rng_seed` pins the RNG for reproducible systems;
    /// `None` seeds from entropy.
    pub fn build(
        emitter: &EmitterData,
        life_range: (f32, f32),
        rng_seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        emitter.validate()?;
        let (life_min, life_max) = life_range;
        if !life_min.is_finite() || !life_max.is_finite() || life_min > life_max || life_min < 0.0 {
            return Err(ConfigError::InvalidRange {
                name: "life",
                min: life_min,
                max: life_max,
            });
        }

        let grid = SlotGrid::from_slot_count(emitter.positions.len() as u32)?;
        let count = grid.slot_count() as usize;

        let mut rng = match rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut initial_state = Vec::with_capacity(count * 4);
        let mut spawn_records = Vec::with_capacity(count * 4);
        let mut random_records = Vec::with_capacity(count * 4);
        let mut direction_seeds = Vec::with_capacity(count * 4);

        for (slot, pos) in emitter.positions.iter().enumerate() {
            let max_life = match &emitter.max_life {
                Some(lives) => lives[slot],
                None => life_min + rng.gen::<f32>() * (life_max - life_min),
            };

            initial_state.extend_from_slice(&[pos.x, pos.y, pos.z, DORMANT]);
            spawn_records.extend_from_slice(&[pos.x, pos.y, pos.z, max_life]);
            random_records.extend_from_slice(&[
                rng.gen::<f32>(),
                rng.gen::<f32>(),
                rng.gen::<f32>(),
                rng.gen::<f32>(),
            ]);

            let seed = match &emitter.seeds {
                Some(seeds) => jitter_direction(seeds.vectors[slot], seeds.jitter, &mut rng),
                None => Vec3::ZERO,
            };
            direction_seeds.extend_from_slice(&[seed.x, seed.y, seed.z, 0.0]);
        }

        Ok(Self {
            grid,
            initial_state,
            spawn_records,
            random_records,
            direction_seeds,
            seed_source: emitter.seeds.as_ref().map(|s| s.source),
        })
    }
}

/// Rotate `dir` by a random angle up to `amount * pi` around a random axis
/// perpendicular to it. Zero amount or a degenerate direction is a no-op.
fn jitter_direction(dir: Vec3, amount: f32, rng: &mut SmallRng) -> Vec3 {
    if amount <= 0.0 || dir.length_squared() < 1e-12 {
        return dir;
    }
    let unit = dir.normalize();
    let random_vec = Vec3::new(
        rng.gen::<f32>() * 2.0 - 1.0,
        rng.gen::<f32>() * 2.0 - 1.0,
        rng.gen::<f32>() * 2.0 - 1.0,
    );
    let mut axis = unit.cross(random_vec);
    if axis.length_squared() < 1e-8 {
        axis = unit.any_orthonormal_vector();
    }
    let angle = rng.gen::<f32>() * amount * PI;
    Quat::from_axis_angle(axis.normalize(), angle) * dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::DirectionSeeds;

    fn ring_emitter(count: usize) -> EmitterData {
        let positions = (0..count)
            .map(|i| {
                let a = i as f32 / count as f32 * 2.0 * PI;
                Vec3::new(a.cos(), 0.0, a.sin())
            })
            .collect();
        EmitterData::from_positions(positions)
    }

    #[test]
    fn test_grid_mapping_roundtrip() {
        let grid = SlotGrid::from_slot_count(64).unwrap();
        assert_eq!(grid.side(), 8);
        for slot in 0..64 {
            let (x, y) = grid.texel(slot);
            assert_eq!(grid.slot(x, y), slot);
        }
        // uv of slot 0 is the first texel center
        let (u, v) = grid.uv(0);
        assert!((u - 0.0625).abs() < 1e-6);
        assert!((v - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_grid_rejects_bad_counts() {
        assert_eq!(SlotGrid::from_slot_count(0), Err(ConfigError::EmptySystem));
        assert_eq!(SlotGrid::from_slot_count(15), Err(ConfigError::NotSquare(15)));
    }

    #[test]
    fn test_buffers_shapes_and_dormant_init() {
        let buffers = SlotBuffers::build(&ring_emitter(16), (1.0, 2.0), Some(7)).unwrap();
        assert_eq!(buffers.initial_state.len(), 64);
        assert_eq!(buffers.spawn_records.len(), 64);
        assert_eq!(buffers.random_records.len(), 64);
        assert_eq!(buffers.direction_seeds.len(), 64);

        for slot in 0..16 {
            // every slot starts dormant at its spawn position
            assert_eq!(buffers.initial_state[slot * 4 + 3], DORMANT);
            assert_eq!(
                &buffers.initial_state[slot * 4..slot * 4 + 3],
                &buffers.spawn_records[slot * 4..slot * 4 + 3],
            );
            // lifetimes drawn from the range
            let life = buffers.spawn_records[slot * 4 + 3];
            assert!((1.0..=2.0).contains(&life));
            // randoms in [0, 1)
            for c in 0..4 {
                let r = buffers.random_records[slot * 4 + c];
                assert!((0.0..1.0).contains(&r));
            }
        }
    }

    #[test]
    fn test_explicit_lifetimes_override_range() {
        let emitter = ring_emitter(4).with_max_life(vec![3.0, 4.0, 5.0, 6.0]);
        let buffers = SlotBuffers::build(&emitter, (1.0, 2.0), Some(0)).unwrap();
        for slot in 0..4 {
            assert_eq!(buffers.spawn_records[slot * 4 + 3], 3.0 + slot as f32);
        }
    }

    #[test]
    fn test_seedless_emitter_gets_zero_seed_buffer() {
        let buffers = SlotBuffers::build(&ring_emitter(4), (1.0, 1.0), Some(0)).unwrap();
        assert!(buffers.seed_source.is_none());
        assert!(buffers.direction_seeds.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_seed_jitter_preserves_length() {
        let seeds = DirectionSeeds::curve_tangents(vec![Vec3::new(0.0, 2.0, 0.0); 4])
            .with_jitter(0.5);
        let emitter = ring_emitter(4).with_seeds(seeds);
        let buffers = SlotBuffers::build(&emitter, (1.0, 1.0), Some(11)).unwrap();
        for slot in 0..4 {
            let s = &buffers.direction_seeds[slot * 4..slot * 4 + 3];
            let len = (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]).sqrt();
            assert!((len - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_fixed_rng_seed_is_deterministic() {
        let a = SlotBuffers::build(&ring_emitter(16), (1.0, 2.0), Some(42)).unwrap();
        let b = SlotBuffers::build(&ring_emitter(16), (1.0, 2.0), Some(42)).unwrap();
        assert_eq!(a.random_records, b.random_records);
        assert_eq!(a.spawn_records, b.spawn_records);
    }

    #[test]
    fn test_invalid_life_range_rejected() {
        let err = SlotBuffers::build(&ring_emitter(4), (2.0, 1.0), Some(0)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRange { name: "life", .. }));
    }
}
