//! Lifetime Component
//!
//! Counts down and asks its entity to leave the scene once expired.

use crate::ecs::{Component, ComponentContext};

/// Lifetime component for entities that should despawn after a duration
#[derive(Debug, Clone, Copy)]
pub struct LifetimeComponent {
    /// How long the entity should live (in seconds); zero or less is infinite
    pub duration: f64,
    age: f64,
    removal_requested: bool,
}

impl LifetimeComponent {
    /// Create a new lifetime component
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            age: 0.0,
            removal_requested: false,
        }
    }

    /// Seconds lived so far
    pub fn age(&self) -> f64 {
        self.age
    }

    /// Check if this entity's lifetime has expired
    pub fn is_expired(&self) -> bool {
        self.duration > 0.0 && self.age >= self.duration
    }

    /// Get remaining lifetime in seconds
    pub fn remaining(&self) -> f64 {
        if self.duration <= 0.0 {
            f64::INFINITY
        } else {
            (self.duration - self.age).max(0.0)
        }
    }
}

impl Component for LifetimeComponent {
    fn update(&mut self, ctx: &ComponentContext<'_>, delta_time: f64) {
        self.age += delta_time;
        if self.is_expired() && !self.removal_requested {
            self.removal_requested = true;
            log::debug!("{} expired after {:.3}s", ctx.entity(), self.age);
            ctx.entity().remove_from_delegate();
        }
    }
}
