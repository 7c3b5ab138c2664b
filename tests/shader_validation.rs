//! Parse and validate every generated program variant with naga.
//!
//! The unit tests assert on generated source content; these tests catch the
//! other failure mode, WGSL that does not compile. Each force shape, axis
//! mask, and space/normalize combination gets its variant validated.

use fbosim::forces::{
    AxisMask, DirectionMode, ForceDescriptor, ForceSet, Polarity, ReturnForce, RotationPlane,
};
use fbosim::shader::{generate_simulation_shader, SimulationSpace};
use glam::Vec3;

fn validate_wgsl(code: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(code)
        .map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}

fn assert_valid(forces: &ForceSet, space: SimulationSpace, normalize: bool) {
    let source = generate_simulation_shader(forces, space, normalize);
    if let Err(e) = validate_wgsl(&source) {
        panic!("{e}\n---\n{source}");
    }
}

fn set(forces: Vec<ForceDescriptor>) -> ForceSet {
    let mut s = ForceSet::new();
    for f in forces {
        s.add(f);
    }
    s
}

fn directional(mode: DirectionMode, count: usize) -> ForceDescriptor {
    ForceDescriptor::Directional {
        directions: vec![Vec3::Y; count],
        mode,
        random_spread: 0.2,
        strength: 1.0,
    }
}

fn noise(axes: AxisMask) -> ForceDescriptor {
    ForceDescriptor::Noise {
        axes,
        seed: Vec3::new(31.0, 517.0, 88.0),
        period: Vec3::splat(2.0),
        strength: 0.5,
    }
}

fn point(axes: AxisMask, return_force: Option<ReturnForce>) -> ForceDescriptor {
    ForceDescriptor::Point {
        position: Vec3::new(0.0, 1.0, 0.0),
        polarity: Polarity::Attract,
        axes,
        effective_radius: 2.0,
        strength: 1.0,
        return_force,
    }
}

#[test]
fn test_empty_variants() {
    assert_valid(&ForceSet::new(), SimulationSpace::Local, false);
    assert_valid(&ForceSet::new(), SimulationSpace::World, false);
    assert_valid(&ForceSet::new(), SimulationSpace::Local, true);
}

#[test]
fn test_directional_variants() {
    assert_valid(
        &set(vec![directional(DirectionMode::Constant, 1)]),
        SimulationSpace::Local,
        false,
    );
    assert_valid(
        &set(vec![directional(DirectionMode::OverLife, 4)]),
        SimulationSpace::Local,
        false,
    );
    // single-entry OverLife degrades to the constant block
    assert_valid(
        &set(vec![directional(DirectionMode::OverLife, 1)]),
        SimulationSpace::Local,
        false,
    );
}

#[test]
fn test_noise_axis_variants() {
    for axes in [AxisMask::Xyz, AxisMask::Xy, AxisMask::Xz, AxisMask::Yz] {
        assert_valid(&set(vec![noise(axes)]), SimulationSpace::Local, false);
    }
}

#[test]
fn test_rotational_plane_variants() {
    for plane in [RotationPlane::Xy, RotationPlane::Xz, RotationPlane::Yz] {
        let force = ForceDescriptor::Rotational {
            center: Vec3::ZERO,
            plane,
            strength: 1.5,
        };
        assert_valid(&set(vec![force]), SimulationSpace::Local, false);
    }
}

#[test]
fn test_point_variants() {
    assert_valid(
        &set(vec![point(AxisMask::Xyz, None)]),
        SimulationSpace::Local,
        false,
    );
    assert_valid(
        &set(vec![point(AxisMask::Xz, Some(ReturnForce { strength: 1.0 }))]),
        SimulationSpace::Local,
        false,
    );
}

#[test]
fn test_seed_force_variants() {
    assert_valid(
        &set(vec![ForceDescriptor::CurveTangent { strength: 1.0 }]),
        SimulationSpace::Local,
        false,
    );
    assert_valid(
        &set(vec![ForceDescriptor::SurfaceNormal { strength: 1.0 }]),
        SimulationSpace::World,
        false,
    );
}

#[test]
fn test_all_forces_combined() {
    let forces = set(vec![
        directional(DirectionMode::OverLife, 8),
        ForceDescriptor::CurveTangent { strength: 0.5 },
        noise(AxisMask::Xyz),
        ForceDescriptor::Rotational {
            center: Vec3::new(1.0, 0.0, -1.0),
            plane: RotationPlane::Xz,
            strength: 2.0,
        },
        point(AxisMask::Xyz, Some(ReturnForce { strength: 0.5 })),
    ]);
    assert_valid(&forces, SimulationSpace::World, true);
}

#[test]
fn test_mixed_curl_dimensions() {
    // 2D and 3D curl never coexist in one set (one noise force per system),
    // but each must validate alongside the jitter helpers
    let forces = set(vec![
        directional(DirectionMode::Constant, 1),
        noise(AxisMask::Yz),
    ]);
    assert_valid(&forces, SimulationSpace::Local, false);
}
