//! Frame clock for driving the simulation loop.
//!
//! [`ParticleSystem::step`](crate::simulation::ParticleSystem::step) takes a
//! plain delta in seconds, so any clock works; this one covers the common
//! loop needs: real or fixed deltas, a time scale, pausing, and an FPS
//! readout.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let (_, delta) = clock.update();
//!     system.step(delta)?;
//! }
//! ```

use std::time::{Duration, Instant};

/// Wall-clock frame timing with pause and scaling.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    pause_elapsed: Duration,
    /// Overrides the measured delta when set, for deterministic stepping.
    fixed_delta: Option<f32>,
    time_scale: f32,
}

impl FrameClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance the clock one frame. Returns `(elapsed, delta)` in seconds.
    ///
    /// While paused, the delta is zero and elapsed time holds.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, 0.0);
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta) * self.time_scale;
        self.last_frame = now;

        let raw_elapsed = now.duration_since(self.start) - self.pause_elapsed;
        self.elapsed_secs = raw_elapsed.as_secs_f32() * self.time_scale;

        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Seconds of unpaused time since the clock started.
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Seconds since the previous frame.
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames counted so far.
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed frames per second, refreshed every half second.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether the clock is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop time: deltas become zero until [`FrameClock::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause. The paused span is excluded from elapsed time
    /// and from the next frame's delta.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    /// Use a fixed delta instead of measured frame time; `None` restores
    /// real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Scale deltas and elapsed time; clamped to non-negative.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_update_advances() {
        let mut clock = FrameClock::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = clock.update();
        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut clock = FrameClock::new();
        clock.update();
        clock.pause();

        let before = clock.elapsed();
        thread::sleep(Duration::from_millis(10));
        clock.update();

        assert_eq!(clock.elapsed(), before);
        assert_eq!(clock.delta(), 0.0);
    }

    #[test]
    fn test_fixed_delta_overrides_measurement() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        thread::sleep(Duration::from_millis(50));
        clock.update();
        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_time_scale_clamps_negative() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(-2.0);
        clock.update();
        assert_eq!(clock.delta(), 0.0);
    }
}
