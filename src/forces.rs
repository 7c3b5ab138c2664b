//! Force generators and their composition.
//!
//! Forces are combined additively into a single per-slot direction vector
//! inside the simulation shader. The active set is fixed when the simulation
//! program is compiled: each force contributes a WGSL block to exactly one
//! program variant, so the per-texel code has no runtime dispatch over a
//! force list. Numeric parameters (strengths, centers, seeds) live in the
//! uniform block and may change every frame without recompiling; adding or
//! removing a force kind requires a new program.
//!
//! Accumulation order is fixed: Directional, CurveTangent / SurfaceNormal,
//! Noise, Rotational, Point. The Point force's optional return term runs
//! last and reads the *accumulated* direction - it is a fallback that only
//! applies when every other term cancelled out or was out of range.
//!
//! # Example
//!
//! ```ignore
//! let mut forces = ForceSet::new();
//! forces.add(ForceDescriptor::Directional {
//!     directions: vec![Vec3::Y],
//!     mode: DirectionMode::Constant,
//!     random_spread: 0.2,
//!     strength: 1.0,
//! });
//! forces.add(ForceDescriptor::Noise {
//!     axes: AxisMask::Xz,
//!     seed: Vec3::new(31.0, 517.0, 88.0),
//!     period: Vec3::splat(2.0),
//!     strength: 0.5,
//! });
//! ```

use glam::Vec3;

use crate::emitter::SeedSource;

/// Maximum number of entries in a directional force's direction sequence.
/// Bounded by the fixed uniform array the shader variant indexes into.
pub const MAX_DIRECTIONS: usize = 8;

/// How a directional force resolves its direction sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DirectionMode {
    /// Single direction, jittered per slot by a random cone.
    #[default]
    Constant,
    /// Piecewise-linear blend across the sequence, keyed by life fraction.
    OverLife,
}

/// Axis subset a noise or point force operates on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisMask {
    /// All three axes.
    #[default]
    Xyz,
    /// XY plane only.
    Xy,
    /// XZ plane only.
    Xz,
    /// YZ plane only.
    Yz,
}

impl AxisMask {
    /// WGSL swizzle for the two-axis masks; `None` for [`AxisMask::Xyz`].
    fn plane_swizzle(self) -> Option<(&'static str, &'static str, &'static str)> {
        match self {
            AxisMask::Xyz => None,
            AxisMask::Xy => Some(("xy", "x", "y")),
            AxisMask::Xz => Some(("xz", "x", "z")),
            AxisMask::Yz => Some(("yz", "y", "z")),
        }
    }

    fn key(self) -> &'static str {
        match self {
            AxisMask::Xyz => "xyz",
            AxisMask::Xy => "xy",
            AxisMask::Xz => "xz",
            AxisMask::Yz => "yz",
        }
    }
}

/// Plane a rotational force spins particles in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationPlane {
    /// Rotate around the Z axis.
    Xy,
    /// Rotate around the Y axis.
    #[default]
    Xz,
    /// Rotate around the X axis.
    Yz,
}

impl RotationPlane {
    fn swizzle(self) -> (&'static str, &'static str, &'static str) {
        match self {
            RotationPlane::Xy => ("xy", "x", "y"),
            RotationPlane::Xz => ("xz", "x", "z"),
            RotationPlane::Yz => ("yz", "y", "z"),
        }
    }
}

/// Whether a point force pulls particles in or pushes them away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Polarity {
    /// Pull toward the point.
    #[default]
    Attract,
    /// Push away from the point.
    Repel,
}

impl Polarity {
    /// Sign multiplier uploaded in the uniform block.
    pub(crate) fn sign(self) -> f32 {
        match self {
            Polarity::Attract => 1.0,
            Polarity::Repel => -1.0,
        }
    }
}

/// Fallback force pulling a slot back to its spawn position when the
/// accumulated direction is near zero. Configured on [`ForceDescriptor::Point`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReturnForce {
    /// Strength of the pull back toward the spawn position.
    pub strength: f32,
}

/// Discriminant for the force catalog; at most one active configuration per
/// kind exists in a [`ForceSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceKind {
    /// Fixed or life-blended direction.
    Directional,
    /// Curl noise field.
    Noise,
    /// Tangential spin around a center.
    Rotational,
    /// Attraction/repulsion toward a point.
    Point,
    /// Along the per-slot curve tangent seed.
    CurveTangent,
    /// Along the per-slot mesh normal seed.
    SurfaceNormal,
}

/// One configured force generator.
#[derive(Clone, Debug, PartialEq)]
pub enum ForceDescriptor {
    /// Push along one or more fixed directions.
    Directional {
        /// Direction sequence, 1 to [`MAX_DIRECTIONS`] entries.
        directions: Vec<Vec3>,
        /// Constant (with jitter) or blended over life.
        mode: DirectionMode,
        /// Cone jitter half-angle as a fraction of pi (Constant mode only).
        random_spread: f32,
        /// Force magnitude.
        strength: f32,
    },

    /// Divergence-free curl noise, for turbulent organic motion.
    Noise {
        /// Which axes the curl acts on (two-axis masks use a 2D curl).
        axes: AxisMask,
        /// Noise domain offset, fixed at configuration time.
        seed: Vec3,
        /// Noise frequency per axis.
        period: Vec3,
        /// Force magnitude.
        strength: f32,
    },

    /// Tangential force spinning particles around a center in one plane.
    Rotational {
        /// Point on the rotation axis.
        center: Vec3,
        /// Plane of rotation.
        plane: RotationPlane,
        /// Rotational strength (sign flips the spin direction).
        strength: f32,
    },

    /// Constant-magnitude pull toward (or push away from) a point, zeroed
    /// outside `effective_radius`.
    Point {
        /// The attractor/repulsor position.
        position: Vec3,
        /// Pull in or push out.
        polarity: Polarity,
        /// Axis subset the force acts on.
        axes: AxisMask,
        /// Slots farther than this are unaffected.
        effective_radius: f32,
        /// Force magnitude.
        strength: f32,
        /// Optional spring back to spawn when nothing else applies.
        return_force: Option<ReturnForce>,
    },

    /// Push along the slot's precomputed curve tangent. Requires a direction
    /// seed buffer sourced from a curve.
    CurveTangent {
        /// Force magnitude.
        strength: f32,
    },

    /// Push along the slot's precomputed mesh surface normal. Requires a
    /// direction seed buffer sourced from a mesh.
    SurfaceNormal {
        /// Force magnitude.
        strength: f32,
    },
}

impl ForceDescriptor {
    /// The catalog kind of this descriptor.
    pub fn kind(&self) -> ForceKind {
        match self {
            ForceDescriptor::Directional { .. } => ForceKind::Directional,
            ForceDescriptor::Noise { .. } => ForceKind::Noise,
            ForceDescriptor::Rotational { .. } => ForceKind::Rotational,
            ForceDescriptor::Point { .. } => ForceKind::Point,
            ForceDescriptor::CurveTangent { .. } => ForceKind::CurveTangent,
            ForceDescriptor::SurfaceNormal { .. } => ForceKind::SurfaceNormal,
        }
    }

    /// Direction seed source this force requires, if any.
    pub fn required_seed(&self) -> Option<SeedSource> {
        match self {
            ForceDescriptor::CurveTangent { .. } => Some(SeedSource::Curve),
            ForceDescriptor::SurfaceNormal { .. } => Some(SeedSource::Mesh),
            _ => None,
        }
    }

    /// Rank in the fixed accumulation order.
    fn rank(&self) -> u8 {
        match self {
            ForceDescriptor::Directional { .. } => 0,
            ForceDescriptor::CurveTangent { .. } => 1,
            ForceDescriptor::SurfaceNormal { .. } => 2,
            ForceDescriptor::Noise { .. } => 3,
            ForceDescriptor::Rotational { .. } => 4,
            ForceDescriptor::Point { .. } => 5,
        }
    }

    /// Short tag identifying this force's shape in the program variant key.
    fn variant_tag(&self) -> String {
        match self {
            ForceDescriptor::Directional { directions, mode, .. } => {
                let mode = match mode {
                    DirectionMode::Constant => "const",
                    DirectionMode::OverLife => "overlife",
                };
                format!("dir-{}-{}", mode, directions.len().min(MAX_DIRECTIONS))
            }
            ForceDescriptor::Noise { axes, .. } => format!("noise-{}", axes.key()),
            ForceDescriptor::Rotational { plane, .. } => {
                format!("rot-{}", plane.swizzle().0)
            }
            ForceDescriptor::Point { axes, return_force, .. } => {
                if return_force.is_some() {
                    format!("point-{}-ret", axes.key())
                } else {
                    format!("point-{}", axes.key())
                }
            }
            ForceDescriptor::CurveTangent { .. } => "tangent".to_string(),
            ForceDescriptor::SurfaceNormal { .. } => "normal".to_string(),
        }
    }

    /// Generate the WGSL accumulation block for this force.
    ///
    /// Blocks run inside the simulation entry point with `pos`, `time_alive`,
    /// `max_life`, `spawn`, `seed`, `rand_signed` and the mutable `dir`
    /// accumulator in scope, and read their numeric parameters from
    /// `uniforms` so they can change per frame.
    pub fn to_wgsl(&self) -> String {
        match self {
            ForceDescriptor::Directional { directions, mode, .. } => {
                if *mode == DirectionMode::OverLife && directions.len() >= 2 {
                    r#"    // directional force: piecewise-linear blend over life
    {
        let dir_count = uniforms.directional.x;
        let t = clamp(time_alive / max(max_life, 0.0001), 0.0, 1.0) * (dir_count - 1.0);
        let seg = u32(clamp(t, 0.0, dir_count - 2.0));
        let blended = mix(
            uniforms.directions[seg].xyz,
            uniforms.directions[seg + 1u].xyz,
            clamp(t - f32(seg), 0.0, 1.0),
        );
        dir += blended * uniforms.directional.z;
    }"#
                    .to_string()
                } else {
                    r#"    // directional force: single direction with per-slot cone jitter
    {
        let base_dir = uniforms.directions[0].xyz;
        dir += randomize_direction(base_dir, uniforms.directional.y, rand_signed) * uniforms.directional.z;
    }"#
                    .to_string()
                }
            }

            ForceDescriptor::CurveTangent { .. } => {
                "    // curve tangent force: precomputed per-slot seed direction\n    dir += seed.xyz * uniforms.seed_params.x;".to_string()
            }

            ForceDescriptor::SurfaceNormal { .. } => {
                "    // surface normal force: precomputed per-slot seed direction\n    dir += seed.xyz * uniforms.seed_params.x;".to_string()
            }

            ForceDescriptor::Noise { axes, .. } => match axes.plane_swizzle() {
                None => r#"    // noise force: 3D curl field
    dir += curl3((pos + uniforms.noise_seed.xyz) * uniforms.noise_period.xyz) * uniforms.noise_seed.w;"#
                    .to_string(),
                Some((sw, a, b)) => format!(
                    r#"    // noise force: 2D curl field on {sw}
    {{
        let n = curl2((pos.{sw} + uniforms.noise_seed.{sw}) * uniforms.noise_period.{sw}) * uniforms.noise_seed.w;
        dir.{a} += n.x;
        dir.{b} += n.y;
    }}"#
                ),
            },

            ForceDescriptor::Rotational { plane, .. } => {
                let (sw, a, b) = plane.swizzle();
                format!(
                    r#"    // rotational force: tangent in the {sw} plane around the center
    {{
        let to_point = safe_normalize2(pos.{sw} - uniforms.rotational.{sw});
        let tangent = vec2<f32>(to_point.y, -to_point.x) * uniforms.rotational.w;
        dir.{a} += tangent.x;
        dir.{b} += tangent.y;
    }}"#
                )
            }

            ForceDescriptor::Point { axes, return_force, .. } => {
                let mut block = match axes.plane_swizzle() {
                    None => r#"    // point force: toward/away within the effective radius
    {
        let to_target = uniforms.point_position.xyz - pos;
        let dist = length(to_target);
        if (dist > 0.01 && dist < uniforms.point_params.x) {
            dir += (to_target / dist) * uniforms.point_params.y * uniforms.point_position.w;
        }
    }"#
                    .to_string(),
                    Some((sw, a, b)) => format!(
                        r#"    // point force on {sw}: toward/away within the effective radius
    {{
        let to_target = uniforms.point_position.{sw} - pos.{sw};
        let dist = length(to_target);
        if (dist > 0.01 && dist < uniforms.point_params.x) {{
            let f = (to_target / dist) * uniforms.point_params.y * uniforms.point_position.w;
            dir.{a} += f.x;
            dir.{b} += f.y;
        }}
    }}"#
                    ),
                };

                if return_force.is_some() {
                    block.push_str(
                        r#"
    // return force: fall back to a pull toward the spawn position when the
    // accumulated direction cancelled out (or the point force was out of range)
    if (length(dir) < 0.01) {
        let return_vec = spawn.xyz - pos;
        if (length(return_vec) > 0.01) {
            dir += normalize(return_vec) * uniforms.point_params.z;
        }
    }"#,
                    );
                }
                block
            }
        }
    }
}

/// WGSL helper functions a compiled force set needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct HelperSet {
    /// Rodrigues rotation + cone jitter (Directional Constant).
    pub jitter: bool,
    /// 2D curl + noise (two-axis Noise).
    pub curl2: bool,
    /// 3D curl + noise (three-axis Noise).
    pub curl3: bool,
}

/// The set of active force generators: at most one per [`ForceKind`],
/// ordered by the fixed accumulation order.
#[derive(Clone, Debug, Default)]
pub struct ForceSet {
    forces: Vec<ForceDescriptor>,
}

impl ForceSet {
    /// Create an empty force set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a force, replacing any existing configuration of the same kind.
    ///
    /// Directional sequences longer than [`MAX_DIRECTIONS`] are truncated
    /// with a warning.
    pub fn add(&mut self, mut force: ForceDescriptor) {
        if let ForceDescriptor::Directional { directions, .. } = &mut force {
            if directions.len() > MAX_DIRECTIONS {
                log::warn!(
                    "Directional force has {} directions; truncating to {}",
                    directions.len(),
                    MAX_DIRECTIONS
                );
                directions.truncate(MAX_DIRECTIONS);
            }
        }
        self.forces.retain(|f| f.kind() != force.kind());
        self.forces.push(force);
        self.forces.sort_by_key(|f| f.rank());
    }

    /// The active configuration of `kind`, if any.
    pub fn get(&self, kind: ForceKind) -> Option<&ForceDescriptor> {
        self.forces.iter().find(|f| f.kind() == kind)
    }

    /// Active forces in accumulation order.
    pub fn iter(&self) -> impl Iterator<Item = &ForceDescriptor> {
        self.forces.iter()
    }

    /// Number of active forces.
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// True when no forces are configured.
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Drop seed-requiring forces whose direction seed buffer is absent or
    /// sourced from the wrong emitter kind. Non-fatal: the force is excluded
    /// from the compiled program and a diagnostic logged.
    pub(crate) fn retain_supported(&mut self, available: Option<SeedSource>) {
        self.forces.retain(|f| match f.required_seed() {
            None => true,
            Some(required) if available == Some(required) => true,
            Some(required) => {
                log::warn!(
                    "{:?} force requires a {:?}-sourced direction seed buffer, which is not configured; the force is disabled",
                    f.kind(),
                    required
                );
                false
            }
        });
    }

    /// Deterministic key identifying the program variant this set compiles
    /// to. Sets that differ only in numeric parameters share a key.
    pub fn variant_key(&self) -> String {
        if self.forces.is_empty() {
            return "none".to_string();
        }
        self.forces
            .iter()
            .map(|f| f.variant_tag())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// WGSL helpers the compiled program must include.
    pub(crate) fn helpers(&self) -> HelperSet {
        let mut h = HelperSet::default();
        for force in &self.forces {
            match force {
                ForceDescriptor::Directional { mode, directions, .. } => {
                    if *mode == DirectionMode::Constant || directions.len() < 2 {
                        h.jitter = true;
                    }
                }
                ForceDescriptor::Noise { axes, .. } => match axes {
                    AxisMask::Xyz => h.curl3 = true,
                    _ => h.curl2 = true,
                },
                _ => {}
            }
        }
        h
    }

    /// Concatenated WGSL accumulation blocks in force order.
    pub(crate) fn to_wgsl(&self) -> String {
        self.forces
            .iter()
            .map(|f| f.to_wgsl())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
