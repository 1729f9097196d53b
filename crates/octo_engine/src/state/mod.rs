//! Game phases
//!
//! [`StateMachine`] holds the closed set of [`GameState`]s; the
//! [`GameCoordinator`] drives it and presents the scene each state names.

pub mod coordinator;
pub mod machine;


pub use coordinator::{GameCoordinator, SceneFactory};
pub use machine::{
    GameState, SceneDescriptor, StateContext, StateKey, StateMachine, TransitionError, UiDescriptor,
};
