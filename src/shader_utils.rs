//! Built-in WGSL helper functions for the generated simulation shader.
//!
//! Helpers are included per program variant: a variant only carries the
//! functions its force set actually calls (the noise/curl block is large).
//! `safe_normalize` is always present - it guards every normalization in
//! generated code so a zero-length vector can never produce NaN.

/// WGSL for guarded normalization. Zero-length input yields the zero vector.
pub const SAFE_NORMALIZE_WGSL: &str = r#"
fn safe_normalize3(v: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if (len < 0.0001) {
        return vec3<f32>(0.0);
    }
    return v / len;
}

fn safe_normalize2(v: vec2<f32>) -> vec2<f32> {
    let len = length(v);
    if (len < 0.0001) {
        return vec2<f32>(0.0);
    }
    return v / len;
}
"#;

/// WGSL for axis-angle rotation and per-slot cone jitter.
///
/// `randomize_direction` tilts `dir` by up to `amount * pi` around an axis
/// perpendicular to it, using the slot's signed randoms so the jitter is
/// stable per slot across frames.
pub const ROTATE_WGSL: &str = r#"
// Rodrigues rotation of v around a unit axis
fn rotate3d(v: vec3<f32>, axis: vec3<f32>, angle: f32) -> vec3<f32> {
    let c = cos(angle);
    let s = sin(angle);
    return v * c + cross(axis, v) * s + axis * dot(axis, v) * (1.0 - c);
}

// Cone jitter: r is the slot's signed random vec4 in [-1, 1]
fn randomize_direction(dir: vec3<f32>, amount: f32, r: vec4<f32>) -> vec3<f32> {
    if (amount <= 0.0) {
        return dir;
    }
    let base = safe_normalize3(dir);
    var axis = cross(base, r.xyz);
    if (length(axis) < 0.0001) {
        axis = cross(base, vec3<f32>(0.0, 1.0, 0.0));
        if (length(axis) < 0.0001) {
            axis = vec3<f32>(1.0, 0.0, 0.0);
        }
    }
    return rotate3d(dir, safe_normalize3(axis), amount * 3.14159265 * r.w);
}
"#;

/// WGSL for 3D simplex noise (and a 2D wrapper). Output in [-1, 1].
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

// 3D Simplex noise
fn noise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0/6.0, 1.0/3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    // First corner
    var i = floor(v + dot(v, vec3(C.y)));
    let x0 = v - i + dot(i, vec3(C.x));

    // Other corners
    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.x;
    let x2 = x0 - i2 + C.y;
    let x3 = x0 - D.yyy;

    // Permutations
    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
      + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
      + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    // Gradients
    let n_ = 0.142857142857;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);

    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    // Normalize gradients
    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0,p0), dot(p1,p1), dot(p2,p2), dot(p3,p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix final noise value
    var m = max(0.6 - vec4<f32>(dot(x0,x0), dot(x1,x1), dot(x2,x2), dot(x3,x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m*m, vec4<f32>(dot(p0,x0), dot(p1,x1), dot(p2,x2), dot(p3,x3)));
}

// 2D Simplex noise (wrapper using z=0)
fn noise2(p: vec2<f32>) -> f32 {
    return noise3(vec3<f32>(p, 0.0));
}
"#;

/// WGSL for the 3D curl field: central differences over a pseudo-vector
/// noise potential, normalized. Divergence-free, so particles swirl rather
/// than cluster. Requires [`NOISE_WGSL`] and [`SAFE_NORMALIZE_WGSL`].
pub const CURL3_WGSL: &str = r#"
// Three decorrelated noise evaluations forming a vector potential
fn noise3_vec(p: vec3<f32>) -> vec3<f32> {
    let s0 = noise3(p);
    let s1 = noise3(vec3<f32>(p.y - 19.1, p.z + 33.4, p.x + 47.2));
    let s2 = noise3(vec3<f32>(p.z + 74.2, p.x - 124.5, p.y + 99.4));
    return vec3<f32>(s0, s1, s2);
}

fn curl3(p: vec3<f32>) -> vec3<f32> {
    let e = 0.1;
    let dx = vec3<f32>(e, 0.0, 0.0);
    let dy = vec3<f32>(0.0, e, 0.0);
    let dz = vec3<f32>(0.0, 0.0, e);

    let p_x0 = noise3_vec(p - dx);
    let p_x1 = noise3_vec(p + dx);
    let p_y0 = noise3_vec(p - dy);
    let p_y1 = noise3_vec(p + dy);
    let p_z0 = noise3_vec(p - dz);
    let p_z1 = noise3_vec(p + dz);

    let x = p_y1.z - p_y0.z - p_z1.y + p_z0.y;
    let y = p_z1.x - p_z0.x - p_x1.z + p_x0.z;
    let z = p_x1.y - p_x0.y - p_y1.x + p_y0.x;

    return safe_normalize3(vec3<f32>(x, y, z) / (2.0 * e));
}
"#;

/// WGSL for the 2D curl field: perpendicular gradient of a scalar noise.
/// Requires [`NOISE_WGSL`] and [`SAFE_NORMALIZE_WGSL`].
pub const CURL2_WGSL: &str = r#"
fn curl2(p: vec2<f32>) -> vec2<f32> {
    let e = 0.1;
    let dndx = noise2(p + vec2<f32>(e, 0.0)) - noise2(p - vec2<f32>(e, 0.0));
    let dndy = noise2(p + vec2<f32>(0.0, e)) - noise2(p - vec2<f32>(0.0, e));
    return safe_normalize2(vec2<f32>(dndy, -dndx) / (2.0 * e));
}
"#;
