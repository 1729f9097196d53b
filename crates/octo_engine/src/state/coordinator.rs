//! Game coordinator
//!
//! Owns the state machine, the entity carrying game-wide components and the
//! registry of scene factories. On every accepted transition it swaps the
//! presented scene when the destination names a different one and tracks the
//! overlay of the current state.

use std::collections::HashMap;
use std::fmt;

use super::machine::{GameState, StateContext, StateKey, StateMachine, TransitionError, UiDescriptor};
use crate::core::config::ClockConfig;
use crate::ecs::Entity;
use crate::foundation::time::FrameClock;
use crate::scene::Scene;

/// Builds a scene; receives the coordinator entity so the scene can relay to
/// game-wide components
pub type SceneFactory = Box<dyn FnMut(&Entity) -> Scene>;

/// Drives game phases and the scene that belongs to each
pub struct GameCoordinator<S: StateKey> {
    machine: StateMachine<S>,
    entity: Entity,
    factories: HashMap<String, SceneFactory>,
    scene: Option<(String, Scene)>,
    ui: Option<UiDescriptor>,
    clock: FrameClock,
    started: bool,
}

impl<S: StateKey> GameCoordinator<S> {
    /// Create a coordinator around a machine
    pub fn new(machine: StateMachine<S>) -> Self {
        Self::with_clock(machine, ClockConfig::default())
    }

    /// Create a coordinator whose `update_at` uses a custom clock
    pub fn with_clock(machine: StateMachine<S>, clock: ClockConfig) -> Self {
        Self {
            machine,
            entity: Entity::named("game coordinator"),
            factories: HashMap::new(),
            scene: None,
            ui: None,
            clock: FrameClock::new(clock),
            started: false,
        }
    }

    /// Register a scene factory under `name`
    ///
    /// Replacing an existing factory logs a warning.
    pub fn register_scene(&mut self, name: impl Into<String>, factory: impl FnMut(&Entity) -> Scene + 'static) {
        let name = name.into();
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            log::warn!("scene factory '{}' replaced", name);
        }
    }

    /// Whether a factory is registered under `name`
    pub fn has_scene(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Enter the initial state
    ///
    /// Starting twice is a no-op.
    pub fn start(&mut self) -> Result<(), TransitionError<S>> {
        if self.started {
            log::warn!("game coordinator already started");
            return Ok(());
        }
        let initial = self.machine.initial_state();
        self.transition(initial)?;
        self.started = true;
        Ok(())
    }

    /// Whether [`start`](Self::start) succeeded
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Attempt a transition, reporting why it failed
    pub fn try_enter(&mut self, next: S) -> Result<(), TransitionError<S>> {
        if !self.started {
            return Err(TransitionError::NotStarted);
        }
        self.transition(next)
    }

    /// Attempt a transition; a rejection is logged and leaves everything as is
    pub fn enter(&mut self, next: S) -> bool {
        match self.try_enter(next) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("transition to {:?} failed: {}", next, error);
                false
            }
        }
    }

    /// Host-facing transition entry point; same as [`enter`](Self::enter)
    pub fn request_transition(&mut self, next: S) -> bool {
        self.enter(next)
    }

    fn transition(&mut self, next: S) -> Result<(), TransitionError<S>> {
        self.machine.check(next)?;
        let descriptor = self.machine.state(next).and_then(|state| state.scene());
        if let Some(descriptor) = &descriptor {
            if !self.factories.contains_key(&descriptor.name) {
                return Err(TransitionError::UnknownScene(descriptor.name.clone()));
            }
        }

        let exit_ctx = self.context();
        let entity = self.entity.clone();
        let factories = &mut self.factories;
        let presented = &mut self.scene;
        let ui = &mut self.ui;
        let clock = &mut self.clock;

        self.machine.transition(next, &exit_ctx, |state: &dyn GameState<S>| {
            if let Some(descriptor) = state.scene() {
                let same = presented.as_ref().is_some_and(|(name, _)| *name == descriptor.name);
                if !same {
                    if let Some((name, old)) = presented.take() {
                        log::info!("dismissing scene '{}'", name);
                        old.teardown();
                    }
                    if let Some(factory) = factories.get_mut(&descriptor.name) {
                        log::info!("presenting scene '{}'", descriptor.name);
                        *presented = Some((descriptor.name, factory(&entity)));
                        clock.reset();
                    }
                }
            }
            *ui = state.ui();
            StateContext::new(entity.clone(), presented.as_ref().map(|(_, scene)| scene.clone()))
        })?;
        Ok(())
    }

    fn context(&self) -> StateContext {
        StateContext::new(self.entity.clone(), self.current_scene().cloned())
    }

    /// Current state
    pub fn current_state(&self) -> Option<S> {
        self.machine.current_state()
    }

    /// Presented scene
    pub fn current_scene(&self) -> Option<&Scene> {
        self.scene.as_ref().map(|(_, scene)| scene)
    }

    /// Registered name of the presented scene
    pub fn current_scene_name(&self) -> Option<&str> {
        self.scene.as_ref().map(|(name, _)| name.as_str())
    }

    /// Overlay of the current state
    pub fn current_ui(&self) -> Option<&UiDescriptor> {
        self.ui.as_ref()
    }

    /// Entity carrying game-wide components
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// The state machine
    pub fn machine(&self) -> &StateMachine<S> {
        &self.machine
    }

    /// Install a machine-wide transition predicate
    pub fn set_transition_guard(&mut self, guard: impl Fn(Option<S>, S) -> bool + 'static) {
        self.machine.set_transition_guard(guard);
    }

    /// Update game-wide components, then the presented scene
    pub fn update(&mut self, delta_time: f64) {
        if !self.started {
            log::trace!("game coordinator not started; skipping update");
            return;
        }
        for component in self.entity.components() {
            component.update(delta_time);
        }
        if let Some(scene) = self.current_scene() {
            scene.update(delta_time);
        }
    }

    /// Advance to host time `current_time` (seconds)
    pub fn update_at(&mut self, current_time: f64) {
        let delta_time = self.clock.tick(current_time);
        self.update(delta_time);
    }

    /// Tear down the presented scene and forget the overlay
    pub fn shutdown(&mut self) {
        if let Some((name, scene)) = self.scene.take() {
            log::info!("shutting down scene '{}'", name);
            scene.teardown();
        }
        self.ui = None;
    }
}

impl<S: StateKey> fmt::Debug for GameCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameCoordinator")
            .field("machine", &self.machine)
            .field("scenes", &self.factories.keys().collect::<Vec<_>>())
            .field("current_scene", &self.current_scene_name())
            .field("started", &self.started)
            .finish()
    }
}
