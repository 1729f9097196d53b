//! Entity-Component-System implementation
//!
//! Entities are identity-bearing containers of at most one component per
//! concrete type. Component systems batch components of one type across a
//! scene and update them in a declared order.

pub mod component;
pub mod components;
pub mod entity;
pub mod relay;
pub mod system;

#[cfg(test)]
mod tests;

pub use component::{AsAny, Component, ComponentContext, ComponentHandle, ComponentKey};
pub use entity::{Entity, EntityDelegate, EntityId, WeakEntity};
pub use relay::RelayComponent;
pub use system::{update_systems, ComponentSystem};
