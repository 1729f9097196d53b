//! # Octo Engine
//!
//! Entity-component runtime for 2D games: entities composed of typed
//! components, ordered component systems, scenes with pause flags, and a
//! finite state machine that decides which scene is presented.
//!
//! ## Features
//!
//! - **Components**: one instance per concrete type per entity, with
//!   add/remove hooks, required co-components and relays to components that
//!   live elsewhere
//! - **Systems**: deterministic two-level update order (systems in declared
//!   order, members in entity-addition order)
//! - **Scenes**: entity registry, render-tree root, independent pause flags
//!   and deferred removal during updates
//! - **Game states**: validated transitions with exit/enter hooks and
//!   per-state scenes and overlays
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octo_engine::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Phase { Play }
//!
//! struct PlayState;
//!
//! impl GameState<Phase> for PlayState {
//!     fn key(&self) -> Phase { Phase::Play }
//!     fn scene(&self) -> Option<SceneDescriptor> { Some(SceneDescriptor::new("arena")) }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let machine = StateMachine::new(Phase::Play, [Box::new(PlayState) as Box<dyn GameState<Phase>>])?;
//!     let mut coordinator = GameCoordinator::new(machine);
//!     coordinator.register_scene("arena", |_| {
//!         let scene = Scene::new("arena");
//!         scene.set_component_systems([ComponentKey::of::<TimeComponent>()]);
//!         scene
//!     });
//!
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.start(coordinator)?;
//!     engine.tick(0.0)?;
//!     engine.tick(1.0 / 60.0)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate)]

// Core engine modules
pub mod config;
pub mod core;

pub mod ecs;
pub mod foundation;
pub mod scene;
pub mod state;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ConfigFormat},
        core::config::{ClockConfig, EngineConfig},
        ecs::{
            components::{
                AgentComponent, GoalComponent, GoalStrategy, LifetimeComponent, NodeComponent, TimeComponent,
                ValueComponent, ValueObserver,
            },
            Component, ComponentContext, ComponentHandle, ComponentKey, ComponentSystem, Entity, RelayComponent,
        },
        foundation::{math::Vec2, time::FrameClock},
        scene::{Node, NodeRef, PauseFlags, Scene},
        state::{
            GameCoordinator, GameState, SceneDescriptor, StateContext, StateMachine, TransitionError, UiDescriptor,
        },
        Engine, EngineError,
    };
}
