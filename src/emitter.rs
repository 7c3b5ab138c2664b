//! Emitter data: the per-slot inputs a system is built from.
//!
//! The crate does not sample emitter shapes itself; the caller brings one
//! position per slot (sampled from a curve, a mesh surface, a point cloud,
//! whatever) and optionally one direction seed per slot. Everything here is
//! consumed once at build time and baked into immutable GPU textures.

use glam::Vec3;

use crate::error::ConfigError;

/// Where a direction seed buffer's vectors came from. Seed-requiring forces
/// check this: a curve-tangent force only runs against curve-sourced seeds,
/// a surface-normal force only against mesh-sourced ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedSource {
    /// Tangents sampled along a curve.
    Curve,
    /// Surface normals sampled from a mesh.
    Mesh,
}

/// Optional per-slot direction seeds, one vector per slot.
#[derive(Clone, Debug)]
pub struct DirectionSeeds {
    /// What the vectors are (tangents or normals).
    pub source: SeedSource,
    /// One direction per slot, same order as the emitter positions.
    pub vectors: Vec<Vec3>,
    /// Cone jitter applied to each seed at build time, as a fraction of pi.
    /// Zero keeps the seeds exact. Only meaningful for curve tangents.
    pub jitter: f32,
}

impl DirectionSeeds {
    /// Curve tangent seeds with no jitter.
    pub fn curve_tangents(vectors: Vec<Vec3>) -> Self {
        Self { source: SeedSource::Curve, vectors, jitter: 0.0 }
    }

    /// Mesh surface normal seeds.
    pub fn mesh_normals(vectors: Vec<Vec3>) -> Self {
        Self { source: SeedSource::Mesh, vectors, jitter: 0.0 }
    }

    /// Set the per-slot cone jitter (fraction of pi).
    pub fn with_jitter(mut self, jitter: f32) -> Self {
        self.jitter = jitter.max(0.0);
        self
    }
}

/// Per-slot spawn data supplied by the caller.
///
/// The number of positions is the slot count and must be a perfect square:
/// state lives in an N x N texture.
#[derive(Clone, Debug, Default)]
pub struct EmitterData {
    /// One spawn position per slot.
    pub positions: Vec<Vec3>,
    /// Optional explicit per-slot lifetime, overriding the system life range.
    pub max_life: Option<Vec<f32>>,
    /// Optional per-slot direction seeds for tangent/normal forces.
    pub seeds: Option<DirectionSeeds>,
}

impl EmitterData {
    /// Emitter with one spawn position per slot and no seeds.
    pub fn from_positions(positions: Vec<Vec3>) -> Self {
        Self { positions, max_life: None, seeds: None }
    }

    /// Attach per-slot lifetimes (must match the position count).
    pub fn with_max_life(mut self, max_life: Vec<f32>) -> Self {
        self.max_life = Some(max_life);
        self
    }

    /// Attach direction seeds (must match the position count).
    pub fn with_seeds(mut self, seeds: DirectionSeeds) -> Self {
        self.seeds = Some(seeds);
        self
    }

    /// Number of slots this emitter describes.
    pub fn slot_count(&self) -> usize {
        self.positions.len()
    }

    /// Check internal consistency: non-empty, square, matched buffer lengths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let count = self.positions.len();
        if count == 0 {
            return Err(ConfigError::EmptySystem);
        }
        let side = (count as f64).sqrt() as usize;
        if side * side != count {
            return Err(ConfigError::NotSquare(count as u32));
        }
        if let Some(max_life) = &self.max_life {
            if max_life.len() != count {
                return Err(ConfigError::LengthMismatch {
                    buffer: "max_life",
                    expected: count,
                    actual: max_life.len(),
                });
            }
        }
        if let Some(seeds) = &self.seeds {
            if seeds.vectors.len() != count {
                return Err(ConfigError::LengthMismatch {
                    buffer: "direction_seeds",
                    expected: count,
                    actual: seeds.vectors.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_square_counts() {
        let emitter = EmitterData::from_positions(vec![Vec3::ZERO; 16]);
        assert!(emitter.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_square() {
        let emitter = EmitterData::from_positions(vec![Vec3::ZERO; 12]);
        assert_eq!(emitter.validate(), Err(ConfigError::NotSquare(12)));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let emitter = EmitterData::default();
        assert_eq!(emitter.validate(), Err(ConfigError::EmptySystem));
    }

    #[test]
    fn test_validate_rejects_mismatched_buffers() {
        let emitter = EmitterData::from_positions(vec![Vec3::ZERO; 4])
            .with_max_life(vec![1.0; 3]);
        assert!(matches!(
            emitter.validate(),
            Err(ConfigError::LengthMismatch { buffer: "max_life", expected: 4, actual: 3 })
        ));

        let emitter = EmitterData::from_positions(vec![Vec3::ZERO; 4])
            .with_seeds(DirectionSeeds::curve_tangents(vec![Vec3::Y; 5]));
        assert!(matches!(
            emitter.validate(),
            Err(ConfigError::LengthMismatch { buffer: "direction_seeds", .. })
        ));
    }
}
