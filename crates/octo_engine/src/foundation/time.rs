//! Frame timing
//!
//! The host render loop hands the engine absolute timestamps; `FrameClock`
//! turns them into per-frame deltas the scene can feed to its systems.

use crate::core::config::ClockConfig;

/// Converts host timestamps into clamped frame deltas
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_time: Option<f64>,
    delta_time: f64,
    total_time: f64,
    frame_count: u64,
    config: ClockConfig,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl FrameClock {
    /// Create a new clock
    pub fn new(config: ClockConfig) -> Self {
        Self {
            last_time: None,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            config,
        }
    }

    /// Advance the clock to `current_time` (seconds) and return the frame delta
    ///
    /// The very first tick yields zero. Without a fixed step, later ticks
    /// yield the measured delta clamped to `max_delta_time`, and the first
    /// tick after [`reset`](Self::reset) yields zero again. With a fixed step,
    /// every tick after the first yields the step, including the one right
    /// after a reset.
    pub fn tick(&mut self, current_time: f64) -> f64 {
        let measured = match self.last_time {
            Some(last) => (current_time - last).max(0.0),
            None => 0.0,
        };
        self.last_time = Some(current_time);

        self.delta_time = match self.config.fixed_time_step {
            Some(step) if self.frame_count > 0 || measured > 0.0 => step,
            Some(_) => 0.0,
            None => measured.min(self.config.max_delta_time),
        };

        self.total_time += self.delta_time;
        self.frame_count += 1;
        self.delta_time
    }

    /// Forget the last timestamp so the next tick does not produce a spike
    pub fn reset(&mut self) {
        self.last_time = None;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Get the total simulated time since creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the current FPS (based on last frame time)
    pub fn current_fps(&self) -> f64 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.tick(12.5), 0.0);
        assert_relative_eq!(clock.tick(12.516), 0.016, epsilon = 1e-9);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new(ClockConfig {
            fixed_time_step: None,
            max_delta_time: 0.1,
        });
        clock.tick(0.0);
        assert_relative_eq!(clock.tick(5.0), 0.1);
    }

    #[test]
    fn test_reset_avoids_spike() {
        let mut clock = FrameClock::default();
        clock.tick(1.0);
        clock.reset();
        assert_eq!(clock.tick(100.0), 0.0);
        assert_relative_eq!(clock.tick(100.02), 0.02, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_step() {
        let mut clock = FrameClock::new(ClockConfig {
            fixed_time_step: Some(1.0 / 60.0),
            max_delta_time: 0.25,
        });
        assert_eq!(clock.tick(0.0), 0.0);
        assert_relative_eq!(clock.tick(0.5), 1.0 / 60.0);
        assert_relative_eq!(clock.total_time(), 1.0 / 60.0);
    }

    #[test]
    fn test_fixed_step_survives_reset() {
        let mut clock = FrameClock::new(ClockConfig {
            fixed_time_step: Some(0.02),
            max_delta_time: 0.25,
        });
        clock.tick(0.0);
        clock.tick(0.5);
        clock.reset();
        assert_relative_eq!(clock.tick(10.0), 0.02);
        assert_eq!(clock.frame_count(), 3);
    }

    #[test]
    fn test_backwards_time_is_ignored() {
        let mut clock = FrameClock::default();
        clock.tick(3.0);
        assert_eq!(clock.tick(2.0), 0.0);
    }
}
