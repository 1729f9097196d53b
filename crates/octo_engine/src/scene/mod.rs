//! Scene management
//!
//! A [`Scene`] owns the entities of one playable area together with their
//! component systems and a root [`Node`] for the render tree.
//!
//! ## Architecture
//!
//! ```text
//! Scene (coordinator, EntityDelegate)
//!   ├── Entities ── Components
//!   ├── ComponentSystems (ordered)
//!   └── Root Node ── entity nodes
//! ```

pub mod node;
mod scene_manager;

pub use node::{Node, NodeRef};
pub use scene_manager::{PauseFlags, Scene};
