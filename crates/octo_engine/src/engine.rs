//! Core engine implementation
//!
//! [`Engine`] is the explicit context a host creates once: it validates the
//! configuration, sets up logging, owns the host clock and drives the game
//! coordinator one tick per host frame.

use std::path::Path;

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::core::config::EngineConfig;
use crate::foundation::{logging, time::FrameClock};
use crate::state::{GameCoordinator, StateKey, TransitionError};

/// Engine bootstrap errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or failed validation
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A coordinator is already installed
    #[error("engine already started")]
    AlreadyStarted,

    /// No coordinator is installed
    #[error("engine not started")]
    NotStarted,

    /// The coordinator could not enter its initial state
    #[error("failed to enter initial state: {0}")]
    StartFailed(String),
}

/// Main engine struct
///
/// Owns the host clock and, once started, the game coordinator.
pub struct Engine<S: StateKey> {
    config: EngineConfig,
    clock: FrameClock,
    coordinator: Option<GameCoordinator<S>>,
}

impl<S: StateKey> Engine<S> {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        logging::init_with_level(&config.log_level);
        log::info!("Initializing engine (log level {})", config.log_level);

        Ok(Self {
            clock: FrameClock::new(config.clock.clone()),
            config,
            coordinator: None,
        })
    }

    /// Create an engine from a TOML or RON configuration file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let config = EngineConfig::load_from_file(path)?;
        Self::new(config)
    }

    /// Install the coordinator and enter its initial state
    pub fn start(&mut self, mut coordinator: GameCoordinator<S>) -> Result<(), EngineError> {
        if self.coordinator.is_some() {
            return Err(EngineError::AlreadyStarted);
        }
        coordinator
            .start()
            .map_err(|e: TransitionError<S>| EngineError::StartFailed(e.to_string()))?;
        self.clock.reset();
        self.coordinator = Some(coordinator);
        log::info!("Engine started");
        Ok(())
    }

    /// Whether a coordinator is installed
    pub fn is_running(&self) -> bool {
        self.coordinator.is_some()
    }

    /// Advance one host frame at `current_time` (seconds)
    ///
    /// Returns the delta handed to the coordinator.
    pub fn tick(&mut self, current_time: f64) -> Result<f64, EngineError> {
        let coordinator = self.coordinator.as_mut().ok_or(EngineError::NotStarted)?;
        let delta_time = self.clock.tick(current_time);
        coordinator.update(delta_time);
        Ok(delta_time)
    }

    /// Request a transition on the installed coordinator
    pub fn request_transition(&mut self, next: S) -> Result<bool, EngineError> {
        let coordinator = self.coordinator.as_mut().ok_or(EngineError::NotStarted)?;
        Ok(coordinator.request_transition(next))
    }

    /// The installed coordinator
    pub fn coordinator(&self) -> Option<&GameCoordinator<S>> {
        self.coordinator.as_ref()
    }

    /// Mutable access to the installed coordinator
    pub fn coordinator_mut(&mut self) -> Option<&mut GameCoordinator<S>> {
        self.coordinator.as_mut()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Host clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Tear down the presented scene and hand the coordinator back
    pub fn shutdown(&mut self) -> Result<GameCoordinator<S>, EngineError> {
        let mut coordinator = self.coordinator.take().ok_or(EngineError::NotStarted)?;
        coordinator.shutdown();
        log::info!("Engine shutdown complete");
        Ok(coordinator)
    }
}
