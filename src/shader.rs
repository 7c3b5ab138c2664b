//! Simulation compute shader generation.
//!
//! One WGSL program is generated per force configuration: each active force
//! contributes its accumulation block, each required helper is included, and
//! everything else is absent from the source. The per-texel lifecycle in the
//! entry point mirrors [`crate::lifecycle::advance_slot`]; the texel-to-slot
//! mapping mirrors [`crate::buffers::SlotGrid`].
//!
//! Programs differing only in numeric parameters share source: those values
//! arrive through the uniform block every frame. [`program_key`] names the
//! variant so callers can cache compiled pipelines.

use crate::forces::ForceSet;
use crate::shader_utils::{CURL2_WGSL, CURL3_WGSL, NOISE_WGSL, ROTATE_WGSL, SAFE_NORMALIZE_WGSL};
use crate::uniforms::UNIFORMS_WGSL;

/// Coordinate space spawn positions are resolved in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimulationSpace {
    /// Spawn records are used as-is; the renderer applies any transform.
    #[default]
    Local,
    /// Spawn records pass through the model matrix at spawn and reset, so
    /// live particles trail behind a moving emitter.
    World,
}

/// Texture bindings shared by every program variant. The seed texture is
/// always bound (all zeros when the emitter has no seeds) so one bind group
/// layout serves all variants.
const TEXTURES_WGSL: &str = r#"
@group(0) @binding(1) var prev_state: texture_2d<f32>;
@group(0) @binding(2) var next_state: texture_storage_2d<rgba32float, write>;
@group(0) @binding(3) var spawn_tex: texture_2d<f32>;
@group(0) @binding(4) var rand_tex: texture_2d<f32>;
@group(0) @binding(5) var seed_tex: texture_2d<f32>;
"#;

/// Deterministic name of the program variant a configuration compiles to.
pub fn program_key(forces: &ForceSet, space: SimulationSpace, normalize: bool) -> String {
    let mut key = forces.variant_key();
    key.push_str(match space {
        SimulationSpace::Local => "+local",
        SimulationSpace::World => "+world",
    });
    if normalize {
        key.push_str("+norm");
    }
    key
}

/// Assemble the WGSL compute program for one force configuration.
pub fn generate_simulation_shader(
    forces: &ForceSet,
    space: SimulationSpace,
    normalize: bool,
) -> String {
    let helpers = forces.helpers();

    let mut helper_code = String::from(SAFE_NORMALIZE_WGSL);
    if helpers.jitter {
        helper_code.push_str(ROTATE_WGSL);
    }
    if helpers.curl2 || helpers.curl3 {
        helper_code.push_str(NOISE_WGSL);
    }
    if helpers.curl2 {
        helper_code.push_str(CURL2_WGSL);
    }
    if helpers.curl3 {
        helper_code.push_str(CURL3_WGSL);
    }

    let spawn_position = match space {
        SimulationSpace::Local => {
            r#"fn spawn_position(record: vec4<f32>) -> vec3<f32> {
    return record.xyz;
}"#
        }
        SimulationSpace::World => {
            r#"fn spawn_position(record: vec4<f32>) -> vec3<f32> {
    return (uniforms.model * vec4<f32>(record.xyz, 1.0)).xyz;
}"#
        }
    };

    // Force blocks run inside the alive branch of the entry point.
    let force_blocks = forces
        .to_wgsl()
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let normalize_block = if normalize {
        "\n        dir = safe_normalize3(dir);\n"
    } else {
        ""
    };

    format!(
        r#"{UNIFORMS_WGSL}
{TEXTURES_WGSL}
{helper_code}
{spawn_position}

@compute @workgroup_size(8, 8)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
    let size = textureDimensions(prev_state);
    if (gid.x >= size.x || gid.y >= size.y) {{
        return;
    }}
    let texel = vec2<i32>(gid.xy);
    let slot = gid.y * size.x + gid.x;

    let state = textureLoad(prev_state, texel, 0);
    let spawn_record = textureLoad(spawn_tex, texel, 0);
    let rand = textureLoad(rand_tex, texel, 0);
    let seed = textureLoad(seed_tex, texel, 0);
    let rand_signed = rand * 2.0 - 1.0;

    let spawn = vec4<f32>(spawn_position(spawn_record), spawn_record.w);
    let max_life = spawn.w;
    let delta = uniforms.frame.x;
    let speed = mix(uniforms.speed.x, uniforms.speed.y, rand.x);

    var pos = state.xyz;
    var time_alive = state.w;

    // Ring offset of this slot from the first activated index. Covers
    // wraparound and the full-cycle span in one comparison.
    let slot_count = size.x * size.y;
    let offset = (slot + slot_count - uniforms.spawn.x - 1u) % slot_count;
    let in_range = offset < uniforms.spawn.y;

    if (time_alive < 0.0 && in_range) {{
        pos = spawn.xyz;
        time_alive = 0.0;
    }}

    // Forces only act on live slots, and see the post-respawn position on
    // the spawn frame (in world space the stale position can be far away).
    if (time_alive >= 0.0) {{
        var dir = vec3<f32>(0.0);

{force_blocks}
{normalize_block}
        time_alive = time_alive + delta;
        pos = pos + dir * delta * speed;

        if (time_alive >= max_life) {{
            pos = spawn.xyz;
            time_alive = -1.0;
        }}
    }}

    textureStore(next_state, texel, vec4<f32>(pos, time_alive));
}}
"#
    )
}
