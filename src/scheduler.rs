//! Ring-buffer spawn scheduling.
//!
//! Slots are (re)activated by a monotonic cursor that sweeps the slot index
//! space and wraps. Each step advances the cursor by `floor(spawn_rate * dt)`;
//! the slots strictly between the previous cursor and the new cursor are the
//! activation range for that frame. A dormant slot inside the range spawns;
//! everything else is untouched.
//!
//! Manual bursts advance the cursor outside the regular per-frame increment.
//! The previous cursor is committed synchronously at the frame boundary inside
//! [`SpawnScheduler::step`], so the first step after a burst always computes
//! its range from the pre-burst cursor. Synchronous commit keeps rapid bursts
//! deterministic: every requested activation lands in exactly one step's
//! range, with no timing window where a wraparound edge slot could be dropped
//! or double-counted.

/// The slot activation range produced by one scheduler step.
///
/// Covers the `span` slots strictly after `previous_cursor` in ring order.
/// `span == slot_count` means every slot is in range (a full-cycle advance),
/// which the three-way cursor comparison cannot express; [`SpawnRange::contains`]
/// uses the ring-offset form instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRange {
    /// Cursor value before this step's advance.
    pub previous_cursor: u32,
    /// Cursor value after this step's advance.
    pub cursor: u32,
    /// Number of slots activated this step, clamped to the slot count.
    pub span: u32,
    slot_count: u32,
}

impl SpawnRange {
    /// Whether `slot` is activated by this range.
    pub fn contains(&self, slot: u32) -> bool {
        debug_assert!(slot < self.slot_count);
        // Ring offset of `slot` measured from the first activated index
        // (previous_cursor + 1). Handles wraparound and the full-coverage
        // case in one expression.
        let offset = (slot + self.slot_count - self.previous_cursor - 1) % self.slot_count;
        offset < self.span
    }

    /// Number of slots activated.
    pub fn len(&self) -> u32 {
        self.span
    }

    /// True when no slots activate this frame.
    pub fn is_empty(&self) -> bool {
        self.span == 0
    }
}

/// Advances the spawn cursor each frame (or on manual burst).
#[derive(Debug)]
pub struct SpawnScheduler {
    slot_count: u32,
    spawn_rate: f32,
    cursor: u32,
    previous_cursor: u32,
    /// Burst slots requested since the last step, folded into the next range.
    pending: u32,
}

impl SpawnScheduler {
    /// Create a scheduler for `slot_count` slots spawning `spawn_rate`
    /// particles per second.
    pub fn new(slot_count: u32, spawn_rate: f32) -> Self {
        assert!(slot_count > 0, "scheduler needs at least one slot");
        Self {
            slot_count,
            spawn_rate: spawn_rate.max(0.0),
            cursor: 0,
            previous_cursor: 0,
            pending: 0,
        }
    }

    /// Current cursor position.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Particles per second.
    pub fn spawn_rate(&self) -> f32 {
        self.spawn_rate
    }

    /// Change the spawn rate; takes effect on the next step.
    pub fn set_spawn_rate(&mut self, rate: f32) {
        self.spawn_rate = rate.max(0.0);
    }

    /// Advance the cursor for one frame and return the activation range.
    ///
    /// The range folds in any bursts requested since the previous step, with
    /// the pre-burst cursor as the range start.
    pub fn step(&mut self, delta: f32) -> SpawnRange {
        let stepped = (self.spawn_rate * delta.max(0.0)).floor() as u32;
        let span = (self.pending + stepped).min(self.slot_count);
        self.pending = 0;

        let previous = self.previous_cursor;
        self.cursor = (self.cursor + stepped) % self.slot_count;
        // Commit synchronously: the next step's range starts here.
        self.previous_cursor = self.cursor;

        SpawnRange {
            previous_cursor: previous,
            cursor: self.cursor,
            span,
            slot_count: self.slot_count,
        }
    }

    /// Request a burst of `count` activations, applied on the next step.
    ///
    /// Bursts accumulate; the total activation per step is clamped to the
    /// slot count (activating a slot twice in one frame is meaningless).
    pub fn burst(&mut self, count: u32) {
        let count = count.min(self.slot_count);
        self.pending = (self.pending + count).min(self.slot_count);
        self.cursor = (self.cursor + count) % self.slot_count;
    }
}
