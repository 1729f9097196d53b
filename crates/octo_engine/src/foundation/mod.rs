//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types for the 2D node contract
//! - Frame timing
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
