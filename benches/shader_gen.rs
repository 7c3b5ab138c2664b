//! Benchmarks for shader generation and CPU-side buffer baking.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use fbosim::buffers::SlotBuffers;
use fbosim::emitter::EmitterData;
use fbosim::forces::{
    AxisMask, DirectionMode, ForceDescriptor, ForceSet, Polarity, ReturnForce, RotationPlane,
};
use fbosim::shader::{generate_simulation_shader, SimulationSpace};

fn all_forces() -> Vec<ForceDescriptor> {
    vec![
        ForceDescriptor::Directional {
            directions: vec![Vec3::Y; 4],
            mode: DirectionMode::OverLife,
            random_spread: 0.2,
            strength: 1.0,
        },
        ForceDescriptor::Noise {
            axes: AxisMask::Xyz,
            seed: Vec3::splat(31.0),
            period: Vec3::splat(2.0),
            strength: 0.5,
        },
        ForceDescriptor::Rotational {
            center: Vec3::ZERO,
            plane: RotationPlane::Xz,
            strength: 1.0,
        },
        ForceDescriptor::Point {
            position: Vec3::ZERO,
            polarity: Polarity::Attract,
            axes: AxisMask::Xyz,
            effective_radius: 2.0,
            strength: 1.0,
            return_force: Some(ReturnForce { strength: 0.5 }),
        },
    ]
}

fn bench_force_to_wgsl(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_to_wgsl");

    for force in all_forces() {
        let name = format!("{:?}", force.kind()).to_lowercase();
        group.bench_function(name, |b| b.iter(|| black_box(force.to_wgsl())));
    }

    group.finish();
}

fn bench_shader_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("shader_generation");

    for count in [0, 1, 2, 4] {
        let mut forces = ForceSet::new();
        for force in all_forces().into_iter().take(count) {
            forces.add(force);
        }
        group.bench_with_input(BenchmarkId::new("forces", count), &forces, |b, forces| {
            b.iter(|| {
                black_box(generate_simulation_shader(
                    forces,
                    SimulationSpace::World,
                    true,
                ))
            })
        });
    }

    group.finish();
}

fn bench_buffer_baking(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_baking");

    for side in [32u32, 128] {
        let count = (side * side) as usize;
        let emitter = EmitterData::from_positions(vec![Vec3::ZERO; count]);
        group.bench_with_input(BenchmarkId::new("slots", count), &emitter, |b, emitter| {
            b.iter(|| black_box(SlotBuffers::build(emitter, (1.0, 3.0), Some(7)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_force_to_wgsl,
    bench_shader_generation,
    bench_buffer_baking,
);
criterion_main!(benches);
