//! A headless fountain: particles spawn around a ring, rise with jitter,
//! and get stirred by curl noise. Prints live/dormant counts as it runs.
//!
//! Run with: `cargo run --example fountain`

use std::f32::consts::TAU;

use fbosim::prelude::*;

fn main() -> Result<(), SystemError> {
    let gpu = GpuContext::new()?;

    let side = 64u32;
    let count = (side * side) as usize;
    let positions: Vec<Vec3> = (0..count)
        .map(|i| {
            let a = i as f32 / count as f32 * TAU;
            Vec3::new(a.cos() * 0.5, 0.0, a.sin() * 0.5)
        })
        .collect();

    let mut system = SystemBuilder::new()
        .with_emitter(EmitterData::from_positions(positions))
        .with_spawn_rate(800.0)
        .with_life_range(1.0, 3.0)
        .with_speed_range(0.5, 1.5)
        .with_rng_seed(7)
        .with_force(ForceDescriptor::Directional {
            directions: vec![Vec3::Y],
            mode: DirectionMode::Constant,
            random_spread: 0.1,
            strength: 1.0,
        })
        .with_force(ForceDescriptor::Noise {
            axes: AxisMask::Xyz,
            seed: Vec3::new(31.0, 517.0, 88.0),
            period: Vec3::splat(1.5),
            strength: 0.35,
        })
        .build(&gpu)?;

    println!(
        "fountain: {} slots, program '{}'",
        system.slot_count(),
        system.program_key()
    );

    // An opening burst on top of the continuous rate
    system.burst(512);

    let mut clock = FrameClock::new();
    clock.set_fixed_delta(Some(1.0 / 60.0));

    for frame in 0..600u32 {
        let (_, delta) = clock.update();
        system.step(delta);

        if frame % 120 == 0 {
            let state = system.read_state().map_err(SystemError::Gpu)?;
            let mut alive = 0u32;
            let mut peak = 0.0f32;
            for slot in state.chunks_exact(4) {
                if slot[3] >= 0.0 {
                    alive += 1;
                    peak = peak.max(slot[1]);
                }
            }
            println!(
                "t={:5.2}s  alive {:4}/{}  peak height {:.2}",
                system.active_time(),
                alive,
                system.slot_count(),
                peak
            );
        }
    }

    Ok(())
}
