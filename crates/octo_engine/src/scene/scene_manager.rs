//! # Scene
//!
//! The scene coordinates one playable area: it owns the entities, the
//! ordered component systems, the render-tree root and the pause flags, and
//! runs the per-frame update.
//!
//! ## Frame contract
//!
//! - Systems update in the order given to [`Scene::set_component_systems`];
//!   members of one system update in the order their entities were added.
//! - Each frame iterates a snapshot. Entities and components added during a
//!   frame join their systems immediately but first update next frame.
//! - Entities asking to be removed during a frame are queued and removed once
//!   the frame's systems have all run.
//! - While any pause flag is set only the systems listed in
//!   [`Scene::set_systems_active_while_paused`] run.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use super::node::{self, Node, NodeRef};
use crate::core::config::ClockConfig;
use crate::ecs::{
    system::update_systems, ComponentHandle, ComponentKey, ComponentSystem, Entity, EntityDelegate,
};
use crate::foundation::time::FrameClock;

bitflags! {
    /// Independent reasons a scene can be paused
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PauseFlags: u8 {
        /// Host-initiated, e.g. the app moved to the background
        const SYSTEM = 1 << 0;
        /// The player pressed pause
        const PLAYER = 1 << 1;
        /// A modal subscene is presented
        const SUBSCENE = 1 << 2;
    }
}

struct SceneInner {
    name: String,
    entity: Entity,
    root_node: NodeRef,
    entities: RefCell<Vec<Entity>>,
    systems: RefCell<Vec<ComponentSystem>>,
    pause: Cell<PauseFlags>,
    active_while_paused: RefCell<Vec<ComponentKey>>,
    pending_removals: RefCell<Vec<Entity>>,
    subscene: RefCell<Option<Entity>>,
    updating: Cell<bool>,
    frame_count: Cell<u64>,
    clock: RefCell<FrameClock>,
    self_weak: Weak<SceneInner>,
}

impl SceneInner {
    fn upgrade(&self) -> Option<Scene> {
        self.self_weak.upgrade().map(Scene)
    }
}

impl EntityDelegate for SceneInner {
    fn component_added(&self, entity: &Entity, component: &ComponentHandle) {
        if let Some(scene) = self.upgrade() {
            scene.register_component(entity, component);
        }
    }

    fn component_will_be_removed(&self, entity: &Entity, component: &ComponentHandle) {
        if let Some(scene) = self.upgrade() {
            scene.unregister_component(entity, component);
        }
    }

    fn entity_requested_removal(&self, entity: &Entity) {
        if let Some(scene) = self.upgrade() {
            scene.remove_entity(entity);
        }
    }

    fn entity_spawned(&self, parent: &Entity, child: &Entity) -> bool {
        log::debug!("{} spawned {} in scene '{}'", parent, child, self.name);
        self.upgrade().is_some_and(|scene| scene.add_entity(child))
    }

    fn scene_entity(&self) -> Option<Entity> {
        Some(self.entity.clone())
    }
}

/// Resets the updating flag even if a component panics mid-frame
struct UpdateGuard<'a>(&'a Cell<bool>);

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Shared scene handle
#[derive(Clone)]
pub struct Scene(Rc<SceneInner>);

impl Scene {
    /// Create an empty scene with the default clock
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_clock(name, ClockConfig::default())
    }

    /// Create an empty scene with a custom clock
    pub fn with_clock(name: impl Into<String>, clock: ClockConfig) -> Self {
        let name = name.into();
        let entity = Entity::named(format!("{name} scene entity"));
        let root_node = Node::new(name.clone()).into_ref();

        let scene = Self(Rc::new_cyclic(|self_weak| SceneInner {
            name,
            entity: entity.clone(),
            root_node,
            entities: RefCell::new(Vec::new()),
            systems: RefCell::new(Vec::new()),
            pause: Cell::new(PauseFlags::empty()),
            active_while_paused: RefCell::new(Vec::new()),
            pending_removals: RefCell::new(Vec::new()),
            subscene: RefCell::new(None),
            updating: Cell::new(false),
            frame_count: Cell::new(0),
            clock: RefCell::new(FrameClock::new(clock)),
            self_weak: self_weak.clone(),
        }));

        scene.add_entity(&entity);
        log::debug!("created scene '{}'", scene.name());
        scene
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Scene-level entity; relays resolve scene components against it
    pub fn entity(&self) -> &Entity {
        &self.0.entity
    }

    /// Root of the render tree
    pub fn root_node(&self) -> &NodeRef {
        &self.0.root_node
    }

    /// Same scene check
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ----------------------------------------------------------------------
    // Component systems
    // ----------------------------------------------------------------------

    /// Replace the systems with one per key, in the given order
    ///
    /// Existing entities are scanned so the new systems start populated.
    pub fn set_component_systems(&self, keys: impl IntoIterator<Item = ComponentKey>) {
        let mut systems: Vec<ComponentSystem> = Vec::new();
        for key in keys {
            if systems.iter().any(|s| s.key() == key) {
                log::warn!("scene '{}': duplicate {} system ignored", self.name(), key);
                continue;
            }
            systems.push(ComponentSystem::new(key));
        }

        for entity in self.entities() {
            for system in &mut systems {
                system.add_components_found_in(&entity);
            }
        }

        log::debug!(
            "scene '{}' systems: {:?}",
            self.name(),
            systems.iter().map(ComponentSystem::key).collect::<Vec<_>>()
        );
        *self.0.systems.borrow_mut() = systems;
    }

    /// Append one system after the existing ones
    pub fn add_component_system(&self, key: ComponentKey) -> bool {
        if self.0.systems.borrow().iter().any(|s| s.key() == key) {
            log::warn!("scene '{}' already has a {} system", self.name(), key);
            return false;
        }
        let mut system = ComponentSystem::new(key);
        for entity in self.entities() {
            system.add_components_found_in(&entity);
        }
        self.0.systems.borrow_mut().push(system);
        true
    }

    /// Keys of the systems in update order
    pub fn component_system_keys(&self) -> Vec<ComponentKey> {
        self.0.systems.borrow().iter().map(ComponentSystem::key).collect()
    }

    /// Snapshot of the system tracking `key`
    pub fn component_system(&self, key: ComponentKey) -> Option<ComponentSystem> {
        self.0.systems.borrow().iter().find(|s| s.key() == key).cloned()
    }

    fn register_component(&self, entity: &Entity, component: &ComponentHandle) {
        for system in self.0.systems.borrow_mut().iter_mut() {
            system.add_component(component.clone());
        }
        self.attach_node(entity, component);
    }

    fn unregister_component(&self, _entity: &Entity, component: &ComponentHandle) {
        for system in self.0.systems.borrow_mut().iter_mut() {
            system.remove_component(component);
        }
        if let Some(node) = component.node() {
            if node::is_child_of(&node, &self.0.root_node) {
                node::remove_from_parent(&node);
            }
        }
    }

    fn attach_node(&self, entity: &Entity, component: &ComponentHandle) {
        if let Some(node) = component.node() {
            if !node.borrow().has_parent() {
                log::trace!("attaching node of {} to scene '{}'", entity, self.name());
                node::add_child(&self.0.root_node, &node);
            }
        }
    }

    // ----------------------------------------------------------------------
    // Entities
    // ----------------------------------------------------------------------

    /// Add an entity and register its components with matching systems
    ///
    /// Returns false if the entity is already here or belongs to another
    /// scene.
    pub fn add_entity(&self, entity: &Entity) -> bool {
        if self.contains(entity) {
            log::debug!("scene '{}' already contains {}", self.name(), entity);
            return false;
        }
        if entity.delegate().is_some() {
            log::warn!("{} already belongs to another scene; not adding to '{}'", entity, self.name());
            return false;
        }

        let delegate: Weak<dyn EntityDelegate> = self.0.self_weak.clone();
        entity.set_delegate(Some(delegate));
        self.0.entities.borrow_mut().push(entity.clone());

        for component in entity.components() {
            self.register_component(entity, &component);
        }
        log::debug!("scene '{}' added {}", self.name(), entity);
        true
    }

    /// Add several entities in order
    pub fn add_entities<'a>(&self, entities: impl IntoIterator<Item = &'a Entity>) {
        for entity in entities {
            self.add_entity(entity);
        }
    }

    /// Remove an entity, detaching all of its components
    ///
    /// During an update the removal is queued until the frame's systems have
    /// run. Returns false if the entity is not in this scene.
    pub fn remove_entity(&self, entity: &Entity) -> bool {
        if !self.contains(entity) {
            log::debug!("scene '{}' does not contain {}", self.name(), entity);
            return false;
        }
        if self.0.updating.get() {
            let mut pending = self.0.pending_removals.borrow_mut();
            if !pending.contains(entity) {
                log::trace!("queueing removal of {}", entity);
                pending.push(entity.clone());
            }
            return true;
        }

        entity.remove_all_components();
        entity.set_delegate(None);
        self.0.entities.borrow_mut().retain(|e| e != entity);
        log::debug!("scene '{}' removed {}", self.name(), entity);
        true
    }

    fn process_pending_removals(&self) {
        let pending = std::mem::take(&mut *self.0.pending_removals.borrow_mut());
        for entity in pending {
            self.remove_entity(&entity);
        }
    }

    /// Whether the entity is in this scene
    pub fn contains(&self, entity: &Entity) -> bool {
        self.0.entities.borrow().contains(entity)
    }

    /// Snapshot of the entities in addition order
    pub fn entities(&self) -> Vec<Entity> {
        self.0.entities.borrow().clone()
    }

    /// Entities with a matching debug name
    pub fn entities_named(&self, name: &str) -> Vec<Entity> {
        self.0
            .entities
            .borrow()
            .iter()
            .filter(|e| e.name().as_deref() == Some(name))
            .cloned()
            .collect()
    }

    /// Number of entities, the scene entity included
    pub fn entity_count(&self) -> usize {
        self.0.entities.borrow().len()
    }

    /// Remove every entity and system
    ///
    /// Used when the scene is replaced; components get their removal hooks.
    pub fn teardown(&self) {
        log::debug!("tearing down scene '{}'", self.name());
        self.0.pending_removals.borrow_mut().clear();
        *self.0.subscene.borrow_mut() = None;
        for entity in self.entities() {
            self.remove_entity(&entity);
        }
        self.0.systems.borrow_mut().clear();
    }

    // ----------------------------------------------------------------------
    // Pausing
    // ----------------------------------------------------------------------

    /// Current pause flags
    pub fn pause_flags(&self) -> PauseFlags {
        self.0.pause.get()
    }

    /// Whether any pause flag is set
    pub fn is_paused(&self) -> bool {
        !self.0.pause.get().is_empty()
    }

    fn set_pause_flag(&self, flag: PauseFlags, paused: bool) {
        let before = self.0.pause.get();
        let mut after = before;
        after.set(flag, paused);
        if before == after {
            return;
        }
        self.0.pause.set(after);
        log::info!("scene '{}' pause flags {:?} -> {:?}", self.name(), before, after);
        if after.is_empty() {
            // A long pause must not arrive as one huge delta
            self.0.clock.borrow_mut().reset();
        }
    }

    /// Set or clear the host-initiated pause
    pub fn set_paused_by_system(&self, paused: bool) {
        self.set_pause_flag(PauseFlags::SYSTEM, paused);
    }

    /// Set or clear the player-initiated pause
    pub fn set_paused_by_player(&self, paused: bool) {
        self.set_pause_flag(PauseFlags::PLAYER, paused);
    }

    /// Set or clear the subscene-initiated pause
    pub fn set_paused_by_subscene(&self, paused: bool) {
        self.set_pause_flag(PauseFlags::SUBSCENE, paused);
    }

    /// Systems that keep running while the scene is paused
    pub fn set_systems_active_while_paused(&self, keys: impl IntoIterator<Item = ComponentKey>) {
        *self.0.active_while_paused.borrow_mut() = keys.into_iter().collect();
    }

    /// Present a modal overlay entity and pause the rest of the scene
    ///
    /// The overlay's components only update through systems listed in
    /// [`set_systems_active_while_paused`](Self::set_systems_active_while_paused).
    pub fn present_subscene(&self, overlay: &Entity) -> bool {
        if self.0.subscene.borrow().is_some() {
            log::warn!("scene '{}' already presents a subscene", self.name());
            return false;
        }
        if !self.add_entity(overlay) {
            return false;
        }
        *self.0.subscene.borrow_mut() = Some(overlay.clone());
        self.set_paused_by_subscene(true);
        true
    }

    /// Remove the presented overlay and lift the subscene pause
    pub fn dismiss_subscene(&self) -> bool {
        let Some(overlay) = self.0.subscene.borrow_mut().take() else {
            return false;
        };
        self.remove_entity(&overlay);
        self.set_paused_by_subscene(false);
        true
    }

    /// Currently presented overlay
    pub fn subscene(&self) -> Option<Entity> {
        self.0.subscene.borrow().clone()
    }

    // ----------------------------------------------------------------------
    // Frame loop
    // ----------------------------------------------------------------------

    /// Number of frames in which at least one system ran
    pub fn frame_count(&self) -> u64 {
        self.0.frame_count.get()
    }

    /// Whether a frame is in progress
    pub fn is_updating(&self) -> bool {
        self.0.updating.get()
    }

    /// Advance the scene to host time `current_time` (seconds)
    pub fn update_at(&self, current_time: f64) {
        let delta_time = self.0.clock.borrow_mut().tick(current_time);
        self.update(delta_time);
    }

    /// Run one frame with the given delta
    pub fn update(&self, delta_time: f64) {
        if self.0.updating.get() {
            log::warn!("scene '{}': re-entrant update ignored", self.name());
            return;
        }

        let paused = self.is_paused();
        let snapshot: Vec<ComponentSystem> = {
            let systems = self.0.systems.borrow();
            if paused {
                let active = self.0.active_while_paused.borrow();
                systems.iter().filter(|s| active.contains(&s.key())).cloned().collect()
            } else {
                systems.clone()
            }
        };

        if paused && snapshot.is_empty() {
            log::trace!("scene '{}' paused ({:?}); skipping frame", self.name(), self.pause_flags());
            return;
        }

        {
            self.0.updating.set(true);
            let _guard = UpdateGuard(&self.0.updating);
            update_systems(&snapshot, delta_time);
        }

        self.0.frame_count.set(self.0.frame_count.get() + 1);
        self.process_pending_removals();
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.0.name)
            .field("entities", &self.entity_count())
            .field("systems", &self.component_system_keys())
            .field("pause", &self.pause_flags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{NodeComponent, TimeComponent};
    use crate::ecs::Component;
    use crate::foundation::math::Vec2;

    #[derive(Default)]
    struct Marker;
    impl Component for Marker {}

    #[test]
    fn test_scene_creation() {
        let scene = Scene::new("title");
        assert_eq!(scene.name(), "title");
        assert_eq!(scene.entity_count(), 1);
        assert!(scene.contains(scene.entity()));
        assert!(!scene.is_paused());
    }

    #[test]
    fn test_add_entity_registers_components() {
        let scene = Scene::new("play");
        scene.set_component_systems([ComponentKey::of::<TimeComponent>()]);

        let entity = Entity::named("clock");
        let time = entity.insert(TimeComponent::new());
        assert!(scene.add_entity(&entity));
        assert!(!scene.add_entity(&entity));

        let system = scene.component_system(ComponentKey::of::<TimeComponent>()).unwrap();
        assert!(system.contains(&time));
    }

    #[test]
    fn test_components_added_later_join_systems() {
        let scene = Scene::new("play");
        scene.set_component_systems([ComponentKey::of::<TimeComponent>()]);
        let entity = Entity::new();
        scene.add_entity(&entity);

        let time = entity.insert(TimeComponent::new());
        assert!(scene.component_system(ComponentKey::of::<TimeComponent>()).unwrap().contains(&time));

        entity.remove_component::<TimeComponent>();
        assert!(scene.component_system(ComponentKey::of::<TimeComponent>()).unwrap().is_empty());
    }

    #[test]
    fn test_systems_populated_from_existing_entities() {
        let scene = Scene::new("play");
        let entity = Entity::new();
        entity.insert(TimeComponent::new());
        scene.add_entity(&entity);

        scene.set_component_systems([ComponentKey::of::<TimeComponent>(), ComponentKey::of::<Marker>()]);

        assert_eq!(scene.component_system(ComponentKey::of::<TimeComponent>()).unwrap().len(), 1);
        assert!(scene.component_system(ComponentKey::of::<Marker>()).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_system_keys_ignored() {
        let scene = Scene::new("play");
        scene.set_component_systems([ComponentKey::of::<Marker>(), ComponentKey::of::<Marker>()]);
        assert_eq!(scene.component_system_keys().len(), 1);
        assert!(!scene.add_component_system(ComponentKey::of::<Marker>()));
        assert!(scene.add_component_system(ComponentKey::of::<TimeComponent>()));
    }

    #[test]
    fn test_remove_entity_cascades() {
        let scene = Scene::new("play");
        scene.set_component_systems([ComponentKey::of::<TimeComponent>()]);
        let entity = Entity::new();
        let time = entity.insert(TimeComponent::new());
        scene.add_entity(&entity);

        assert!(scene.remove_entity(&entity));

        assert!(!scene.contains(&entity));
        assert!(time.entity().is_none());
        assert!(entity.delegate().is_none());
        assert!(scene.component_system(ComponentKey::of::<TimeComponent>()).unwrap().is_empty());
        assert!(!scene.remove_entity(&entity));
    }

    #[test]
    fn test_entity_in_other_scene_rejected() {
        let a = Scene::new("a");
        let b = Scene::new("b");
        let entity = Entity::new();
        a.add_entity(&entity);
        assert!(!b.add_entity(&entity));
    }

    #[test]
    fn test_nodes_follow_entities() {
        let scene = Scene::new("play");
        let entity = Entity::new();
        let handle = entity.insert(NodeComponent::named("ship", Vec2::new(1.0, 1.0)));
        let node = handle.node().unwrap();

        scene.add_entity(&entity);
        assert!(node::is_child_of(&node, scene.root_node()));

        scene.remove_entity(&entity);
        assert!(scene.root_node().borrow().children().is_empty());
    }

    #[test]
    fn test_spawn_adds_child_entity() {
        let scene = Scene::new("play");
        let parent = Entity::named("ship");
        scene.add_entity(&parent);

        let bullet = Entity::named("bullet");
        assert!(parent.spawn(&bullet));
        assert!(scene.contains(&bullet));
        assert_eq!(scene.entities_named("bullet").len(), 1);
    }

    #[test]
    fn test_remove_from_delegate() {
        let scene = Scene::new("play");
        let entity = Entity::new();
        scene.add_entity(&entity);

        entity.remove_from_delegate();
        assert!(!scene.contains(&entity));
    }

    #[test]
    fn test_pause_flags_are_independent() {
        let scene = Scene::new("play");
        scene.set_paused_by_player(true);
        scene.set_paused_by_system(true);
        scene.set_paused_by_player(false);

        assert!(scene.is_paused());
        assert_eq!(scene.pause_flags(), PauseFlags::SYSTEM);

        scene.set_paused_by_system(false);
        assert!(!scene.is_paused());
    }

    #[test]
    fn test_subscene_presentation() {
        let scene = Scene::new("play");
        let overlay = Entity::named("pause menu");

        assert!(scene.present_subscene(&overlay));
        assert!(!scene.present_subscene(&Entity::new()));
        assert!(scene.pause_flags().contains(PauseFlags::SUBSCENE));

        assert!(scene.dismiss_subscene());
        assert!(!scene.is_paused());
        assert!(!scene.contains(&overlay));
        assert!(!scene.dismiss_subscene());
    }

    #[test]
    fn test_teardown_empties_scene() {
        let scene = Scene::new("play");
        scene.set_component_systems([ComponentKey::of::<TimeComponent>()]);
        let entity = Entity::new();
        let time = entity.insert(TimeComponent::new());
        scene.add_entity(&entity);

        scene.teardown();

        assert_eq!(scene.entity_count(), 0);
        assert!(scene.component_system_keys().is_empty());
        assert!(time.entity().is_none());
    }

    #[test]
    fn test_update_at_uses_clock() {
        let scene = Scene::new("play");
        scene.set_component_systems([ComponentKey::of::<TimeComponent>()]);
        let time = scene.entity().insert(TimeComponent::new());

        scene.update_at(10.0);
        scene.update_at(10.5);

        assert_eq!(scene.frame_count(), 2);
        let elapsed = time.with(|t: &TimeComponent| t.elapsed()).unwrap();
        approx::assert_relative_eq!(elapsed, 0.25);
    }
}
