//! # Core Engine Module
//!
//! Shared configuration types used by the ECS runtime, the game coordinator
//! and the engine context.

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;
pub use crate::ecs;

// Re-export commonly used config types
pub use config::{ClockConfig, EngineConfig};
pub use crate::config::{Config, ConfigError, ConfigFormat};
