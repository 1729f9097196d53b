//! Finite state machine for game phases
//!
//! States form a closed set fixed when the machine is built. A transition is
//! accepted only when the current state lists the destination as a valid next
//! state, the destination accepts entry from the current state, and the
//! optional machine-wide guard agrees. An accepted transition runs the exit
//! hook of the old state, swaps the current state, then runs the enter hook
//! of the new one. A rejected transition changes nothing.

use std::fmt;
use std::hash::Hash;

use thiserror::Error;

use crate::ecs::Entity;
use crate::scene::Scene;

/// Requirements for a state identifier
///
/// Usually a small fieldless enum.
pub trait StateKey: Copy + Eq + Hash + fmt::Debug + 'static {}

impl<T: Copy + Eq + Hash + fmt::Debug + 'static> StateKey for T {}

/// Reasons a transition did not happen
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError<S: fmt::Debug> {
    /// The destination is not one of the machine's states
    #[error("unknown state {0:?}")]
    UnknownState(S),

    /// A validity predicate refused the transition
    #[error("transition from {from:?} to {to:?} rejected")]
    Rejected {
        /// State the machine is in (`None` before the first entry)
        from: Option<S>,
        /// Requested destination
        to: S,
    },

    /// Transition requested before the coordinator was started
    #[error("state machine has not been started")]
    NotStarted,

    /// The destination presents a scene nobody registered
    #[error("no scene registered under '{0}'")]
    UnknownScene(String),
}

/// Names the scene a state presents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneDescriptor {
    /// Key of the scene factory registered with the coordinator
    pub name: String,
}

impl SceneDescriptor {
    /// Describe a scene by its registered name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Declarative overlay shown while a state is current
///
/// The host's UI layer renders it; the runtime only keeps track of which
/// descriptor belongs to the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiDescriptor {
    /// Heading text
    pub title: String,
    /// Menu entries or prompts, top to bottom
    pub items: Vec<String>,
}

impl UiDescriptor {
    /// Overlay with a title and no items
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// Append an item
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }
}

/// What a state hook can reach
#[derive(Debug, Clone)]
pub struct StateContext {
    /// Entity holding game-wide components
    pub entity: Entity,
    /// Scene presented while the hook runs
    pub scene: Option<Scene>,
}

impl StateContext {
    /// Build a context
    pub fn new(entity: Entity, scene: Option<Scene>) -> Self {
        Self { entity, scene }
    }
}

/// One game phase
///
/// Only [`key`](Self::key) is required; every predicate accepts and every
/// hook does nothing unless overridden.
pub trait GameState<S: StateKey> {
    /// Identifier of this state
    fn key(&self) -> S;

    /// Whether the machine may move from this state to `next`
    fn is_valid_next_state(&self, _next: S) -> bool {
        true
    }

    /// Whether this state may be entered from `previous`
    fn accepts_entry_from(&self, _previous: Option<S>) -> bool {
        true
    }

    /// Called after this state became current
    fn did_enter(&mut self, _from: Option<S>, _ctx: &StateContext) {}

    /// Called while this state is still current, before `to` takes over
    fn will_exit(&mut self, _to: S, _ctx: &StateContext) {}

    /// Scene to present while current; `None` keeps the presented scene
    fn scene(&self) -> Option<SceneDescriptor> {
        None
    }

    /// Overlay to show while current
    fn ui(&self) -> Option<UiDescriptor> {
        None
    }
}

type TransitionGuard<S> = Box<dyn Fn(Option<S>, S) -> bool>;

/// Closed set of states with one current state
pub struct StateMachine<S: StateKey> {
    states: Vec<Box<dyn GameState<S>>>,
    initial: S,
    current: Option<S>,
    guard: Option<TransitionGuard<S>>,
}

impl<S: StateKey> StateMachine<S> {
    /// Build a machine from its states and the designated initial state
    ///
    /// A second state with an existing key is dropped with a warning.
    pub fn new(
        initial: S,
        states: impl IntoIterator<Item = Box<dyn GameState<S>>>,
    ) -> Result<Self, TransitionError<S>> {
        let mut unique: Vec<Box<dyn GameState<S>>> = Vec::new();
        for state in states {
            let key = state.key();
            if unique.iter().any(|s| s.key() == key) {
                log::warn!("duplicate state {:?} ignored", key);
                continue;
            }
            unique.push(state);
        }

        if !unique.iter().any(|s| s.key() == initial) {
            return Err(TransitionError::UnknownState(initial));
        }

        Ok(Self {
            states: unique,
            initial,
            current: None,
            guard: None,
        })
    }

    /// Install a machine-wide predicate consulted on every transition
    pub fn set_transition_guard(&mut self, guard: impl Fn(Option<S>, S) -> bool + 'static) {
        self.guard = Some(Box::new(guard));
    }

    /// Remove the machine-wide predicate
    pub fn clear_transition_guard(&mut self) {
        self.guard = None;
    }

    /// Designated initial state
    pub fn initial_state(&self) -> S {
        self.initial
    }

    /// Current state; `None` until the first entry
    pub fn current_state(&self) -> Option<S> {
        self.current
    }

    /// Keys of every state in declaration order
    pub fn state_keys(&self) -> Vec<S> {
        self.states.iter().map(|s| s.key()).collect()
    }

    /// Whether `key` is one of the states
    pub fn has_state(&self, key: S) -> bool {
        self.index_of(key).is_some()
    }

    /// Look up a state
    pub fn state(&self, key: S) -> Option<&dyn GameState<S>> {
        self.index_of(key).map(|i| self.states[i].as_ref())
    }

    fn index_of(&self, key: S) -> Option<usize> {
        self.states.iter().position(|s| s.key() == key)
    }

    /// Check a transition without performing it
    pub fn check(&self, next: S) -> Result<(), TransitionError<S>> {
        let Some(to_index) = self.index_of(next) else {
            return Err(TransitionError::UnknownState(next));
        };
        let rejected = TransitionError::Rejected {
            from: self.current,
            to: next,
        };

        if let Some(from_index) = self.current.and_then(|c| self.index_of(c)) {
            if !self.states[from_index].is_valid_next_state(next) {
                return Err(rejected);
            }
        }
        if !self.states[to_index].accepts_entry_from(self.current) {
            return Err(rejected);
        }
        if let Some(guard) = &self.guard {
            if !guard(self.current, next) {
                return Err(rejected);
            }
        }
        Ok(())
    }

    /// Whether a transition to `next` would be accepted
    pub fn can_enter(&self, next: S) -> bool {
        self.check(next).is_ok()
    }

    /// Transition with one context for both hooks
    ///
    /// Returns the previous state.
    pub fn enter(&mut self, next: S, ctx: &StateContext) -> Result<Option<S>, TransitionError<S>> {
        self.transition(next, ctx, |_| ctx.clone())
    }

    /// Transition, building the enter-hook context after the swap
    ///
    /// `prepare_entry` runs after the exit hook and after the current state
    /// changed, and before the enter hook. It receives the destination so
    /// callers can present its scene and overlay.
    pub fn transition<F>(
        &mut self,
        next: S,
        exit_ctx: &StateContext,
        prepare_entry: F,
    ) -> Result<Option<S>, TransitionError<S>>
    where
        F: FnOnce(&dyn GameState<S>) -> StateContext,
    {
        if let Err(error) = self.check(next) {
            log::warn!("{}", error);
            return Err(error);
        }
        let Some(to_index) = self.index_of(next) else {
            return Err(TransitionError::UnknownState(next));
        };

        let previous = self.current;
        if let Some(from_index) = previous.and_then(|p| self.index_of(p)) {
            self.states[from_index].will_exit(next, exit_ctx);
        }

        self.current = Some(next);
        log::info!("state {:?} -> {:?}", previous, next);

        let entry_ctx = prepare_entry(self.states[to_index].as_ref());
        self.states[to_index].did_enter(previous, &entry_ctx);
        Ok(previous)
    }
}

impl<S: StateKey> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("states", &self.state_keys())
            .field("initial", &self.initial)
            .field("current", &self.current)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}
