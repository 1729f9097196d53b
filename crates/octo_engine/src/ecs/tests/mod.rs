//! Cross-module ECS scenarios
//!
//! Entity, relay and system behavior exercised together, and whole scene
//! frames with ordering, pausing and deferred removal.

mod scene_frames;
