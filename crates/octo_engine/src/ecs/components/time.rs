//! Time component
//!
//! Accumulates elapsed time and frame count. Usually lives on the game
//! coordinator's entity so every scene can read it through a relay.

use crate::ecs::{Component, ComponentContext};

/// Elapsed-time accumulator
#[derive(Debug, Clone, Default)]
pub struct TimeComponent {
    elapsed: f64,
    frames: u64,
    last_delta: f64,
}

impl TimeComponent {
    /// Create a zeroed time component
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds accumulated across updates
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of updates received
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Delta passed to the latest update
    pub fn last_delta(&self) -> f64 {
        self.last_delta
    }

    /// Zero the counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Component for TimeComponent {
    fn update(&mut self, _ctx: &ComponentContext<'_>, delta_time: f64) {
        self.elapsed += delta_time;
        self.frames += 1;
        self.last_delta = delta_time;
    }
}
