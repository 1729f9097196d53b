//! # Engine Configuration
//!
//! Typed settings for the runtime: the log filter and the host clock. Everything here is serializable so hosts can ship a TOML or RON file
//! next to the game.

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::foundation::logging;

/// # Clock Configuration
///
/// Controls how host timestamps become frame deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Replace measured deltas with a fixed step (seconds)
    pub fixed_time_step: Option<f64>,
    /// Largest delta handed to systems (seconds)
    pub max_delta_time: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: None,
            max_delta_time: 0.25,
        }
    }
}

impl ClockConfig {
    /// Use a fixed simulation step
    pub fn with_fixed_step(mut self, step: f64) -> Self {
        self.fixed_time_step = Some(step);
        self
    }

    /// Validate the clock settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(step) = self.fixed_time_step {
            if !(step > 0.0) {
                return Err(ConfigError::Invalid(format!("fixed_time_step must be positive, got {step}")));
            }
        }
        if !(self.max_delta_time > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_delta_time must be positive, got {}",
                self.max_delta_time
            )));
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Top-level configuration applications load at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter for `env_logger`
    pub log_level: String,
    /// Host clock settings
    pub clock: ClockConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            clock: ClockConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set clock configuration
    pub fn with_clock(mut self, clock: ClockConfig) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !logging::is_valid_level(&self.log_level) {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }
        self.clock.validate()
    }
}

impl Config for EngineConfig {}
