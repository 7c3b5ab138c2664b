//! The simulation uniform block.
//!
//! Every program variant shares one fixed-layout uniform struct, regardless
//! of which forces are active: inactive forces simply leave their fields
//! zeroed. This is what lets numeric parameters (strengths, centers, the
//! spawn range, the model matrix) change every frame while the compiled
//! program stays untouched - only adding or removing a force kind forces a
//! recompile.
//!
//! Field packing convention: each force gets one or two `vec4` fields with
//! its scalars folded into the free lanes, so the layout is identical on the
//! CPU ([`SimUniforms`], a `bytemuck` Pod) and in WGSL ([`UNIFORMS_WGSL`]).

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::forces::{DirectionMode, ForceDescriptor, ForceSet, MAX_DIRECTIONS};

/// WGSL declaration of the uniform block, mirrored by [`SimUniforms`].
pub const UNIFORMS_WGSL: &str = r#"
struct SimUniforms {
    // spawn-position transform for world-space simulation (identity in local)
    model: mat4x4<f32>,
    // directional force direction sequence
    directions: array<vec4<f32>, 8>,
    // (min_speed, max_speed, _, _)
    speed: vec4<f32>,
    // (direction_count, random_spread, strength, _)
    directional: vec4<f32>,
    // (noise domain offset.xyz, strength)
    noise_seed: vec4<f32>,
    // (noise frequency.xyz, _)
    noise_period: vec4<f32>,
    // (rotation center.xyz, strength)
    rotational: vec4<f32>,
    // (point position.xyz, polarity sign)
    point_position: vec4<f32>,
    // (effective_radius, strength, return_strength, _)
    point_params: vec4<f32>,
    // (tangent/normal seed strength, _, _, _)
    seed_params: vec4<f32>,
    // (delta, time, _, _)
    frame: vec4<f32>,
    // (previous_cursor, span, _, _)
    spawn: vec4<u32>,
}

@group(0) @binding(0) var<uniform> uniforms: SimUniforms;
"#;

/// CPU-side uniform block, bit-identical to the WGSL `SimUniforms` struct.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SimUniforms {
    pub model: [[f32; 4]; 4],
    pub directions: [[f32; 4]; MAX_DIRECTIONS],
    pub speed: [f32; 4],
    pub directional: [f32; 4],
    pub noise_seed: [f32; 4],
    pub noise_period: [f32; 4],
    pub rotational: [f32; 4],
    pub point_position: [f32; 4],
    pub point_params: [f32; 4],
    pub seed_params: [f32; 4],
    pub frame: [f32; 4],
    pub spawn: [u32; 4],
}

/// Per-frame inputs that feed the uniform block alongside the force set.
#[derive(Clone, Copy, Debug)]
pub struct FrameParams {
    /// Frame delta time in seconds.
    pub delta: f32,
    /// Accumulated active simulation time in seconds.
    pub time: f32,
    /// Model matrix for world-space spawn positions.
    pub model: Mat4,
    /// Spawn cursor before this frame's advance.
    pub previous_cursor: u32,
    /// Number of slots the scheduler activates this frame.
    pub spawn_span: u32,
    /// Per-slot speed range, resolved by each slot's first random.
    pub speed_range: (f32, f32),
}

/// Pack the frame state and the active force parameters into the block.
///
/// Fields belonging to forces not present in `forces` stay zeroed.
pub(crate) fn pack(frame: &FrameParams, forces: &ForceSet) -> SimUniforms {
    let mut u = SimUniforms::zeroed();
    u.model = frame.model.to_cols_array_2d();
    u.speed = [frame.speed_range.0, frame.speed_range.1, 0.0, 0.0];
    u.frame = [frame.delta, frame.time, 0.0, 0.0];
    u.spawn = [frame.previous_cursor, frame.spawn_span, 0, 0];

    for force in forces.iter() {
        match force {
            ForceDescriptor::Directional { directions, mode, random_spread, strength } => {
                for (i, d) in directions.iter().take(MAX_DIRECTIONS).enumerate() {
                    u.directions[i] = [d.x, d.y, d.z, 0.0];
                }
                let spread = match mode {
                    DirectionMode::Constant => *random_spread,
                    DirectionMode::OverLife => 0.0,
                };
                u.directional = [directions.len() as f32, spread, *strength, 0.0];
            }
            ForceDescriptor::Noise { seed, period, strength, .. } => {
                u.noise_seed = [seed.x, seed.y, seed.z, *strength];
                u.noise_period = [period.x, period.y, period.z, 0.0];
            }
            ForceDescriptor::Rotational { center, strength, .. } => {
                u.rotational = [center.x, center.y, center.z, *strength];
            }
            ForceDescriptor::Point {
                position,
                polarity,
                effective_radius,
                strength,
                return_force,
                ..
            } => {
                u.point_position = [position.x, position.y, position.z, polarity.sign()];
                let return_strength = return_force.as_ref().map(|r| r.strength).unwrap_or(0.0);
                u.point_params = [*effective_radius, *strength, return_strength, 0.0];
            }
            ForceDescriptor::CurveTangent { strength }
            | ForceDescriptor::SurfaceNormal { strength } => {
                u.seed_params = [*strength, 0.0, 0.0, 0.0];
            }
        }
    }

    u
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::{AxisMask, Polarity, ReturnForce};
    use glam::Vec3;

    fn frame() -> FrameParams {
        FrameParams {
            delta: 0.016,
            time: 1.5,
            model: Mat4::IDENTITY,
            previous_cursor: 7,
            spawn_span: 3,
            speed_range: (0.5, 2.0),
        }
    }

    #[test]
    fn test_layout_matches_wgsl_struct() {
        // mat4 + 8 vec4 directions + 9 trailing vec4 fields
        assert_eq!(std::mem::size_of::<SimUniforms>(), 64 + 128 + 9 * 16);
        assert_eq!(std::mem::align_of::<SimUniforms>(), 4);
    }

    #[test]
    fn test_pack_frame_state() {
        let u = pack(&frame(), &ForceSet::new());
        assert_eq!(u.frame[0], 0.016);
        assert_eq!(u.frame[1], 1.5);
        assert_eq!(u.spawn[0], 7);
        assert_eq!(u.spawn[1], 3);
        assert_eq!(u.speed, [0.5, 2.0, 0.0, 0.0]);
        // no forces: all force fields zeroed
        assert_eq!(u.directional, [0.0; 4]);
        assert_eq!(u.point_params, [0.0; 4]);
    }

    #[test]
    fn test_pack_point_force() {
        let mut forces = ForceSet::new();
        forces.add(ForceDescriptor::Point {
            position: Vec3::new(1.0, 2.0, 3.0),
            polarity: Polarity::Repel,
            axes: AxisMask::Xyz,
            effective_radius: 4.0,
            strength: 5.0,
            return_force: Some(ReturnForce { strength: 6.0 }),
        });
        let u = pack(&frame(), &forces);
        assert_eq!(u.point_position, [1.0, 2.0, 3.0, -1.0]);
        assert_eq!(u.point_params, [4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn test_pack_directional_spread_only_in_constant_mode() {
        let mut forces = ForceSet::new();
        forces.add(ForceDescriptor::Directional {
            directions: vec![Vec3::Y, Vec3::X],
            mode: DirectionMode::OverLife,
            random_spread: 0.8,
            strength: 2.0,
        });
        let u = pack(&frame(), &forces);
        assert_eq!(u.directional, [2.0, 0.0, 2.0, 0.0]);
        assert_eq!(u.directions[0], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(u.directions[1], [1.0, 0.0, 0.0, 0.0]);
    }
}
