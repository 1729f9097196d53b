//! Entity implementation
//!
//! An entity is an identity plus a type-keyed set of components, holding at
//! most one component per concrete type. Every structural change is reported
//! synchronously to the entity's delegate (normally the scene) so system
//! membership never lags behind the entity's real composition.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::component::{Component, ComponentHandle, ComponentKey};
use super::components::AgentRef;
use crate::scene::NodeRef;

/// Entity identifier, unique for the lifetime of the process
pub type EntityId = u64;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Receives notifications about an entity's structure
///
/// Callbacks are synchronous and fire-and-forget, except for
/// [`entity_spawned`](Self::entity_spawned) which reports acceptance.
pub trait EntityDelegate {
    /// A component was attached to `entity`
    fn component_added(&self, entity: &Entity, component: &ComponentHandle);

    /// A component is about to be detached from `entity`
    fn component_will_be_removed(&self, entity: &Entity, component: &ComponentHandle);

    /// `entity` asked to be removed from its delegate
    fn entity_requested_removal(&self, entity: &Entity);

    /// `parent` asked the delegate to adopt `child`
    fn entity_spawned(&self, parent: &Entity, child: &Entity) -> bool;

    /// Well-known scene-level entity used to resolve relays
    fn scene_entity(&self) -> Option<Entity> {
        None
    }
}

struct EntityData {
    id: EntityId,
    name: RefCell<Option<String>>,
    components: RefCell<Vec<ComponentHandle>>,
    delegate: RefCell<Option<Weak<dyn EntityDelegate>>>,
}

/// Shared entity handle
///
/// Clones refer to the same entity; equality is identity.
#[derive(Clone)]
pub struct Entity(Rc<EntityData>);

/// Non-owning entity reference
#[derive(Clone, Default)]
pub struct WeakEntity(Weak<EntityData>);

impl WeakEntity {
    /// A reference that never upgrades
    pub fn new() -> Self {
        Self(Weak::new())
    }

    /// Upgrade to a strong handle if the entity is alive
    pub fn upgrade(&self) -> Option<Entity> {
        self.0.upgrade().map(Entity)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    /// Create an empty, unnamed entity
    pub fn new() -> Self {
        Self(Rc::new(EntityData {
            id: NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed),
            name: RefCell::new(None),
            components: RefCell::new(Vec::new()),
            delegate: RefCell::new(None),
        }))
    }

    /// Create an empty entity with a debug name
    pub fn named(name: impl Into<String>) -> Self {
        let entity = Self::new();
        entity.set_name(Some(name.into()));
        entity
    }

    /// Create a named entity and add components in order
    ///
    /// Components that require others should come after their dependencies.
    pub fn with_components(name: impl Into<String>, components: impl IntoIterator<Item = ComponentHandle>) -> Self {
        let entity = Self::named(name);
        entity.add_components(components);
        entity
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.0.id
    }

    /// Debug name
    pub fn name(&self) -> Option<String> {
        self.0.name.borrow().clone()
    }

    /// Replace the debug name
    pub fn set_name(&self, name: Option<String>) {
        *self.0.name.borrow_mut() = name;
    }

    /// Non-owning reference to this entity
    pub fn downgrade(&self) -> WeakEntity {
        WeakEntity(Rc::downgrade(&self.0))
    }

    /// Current delegate, if it is still alive
    pub fn delegate(&self) -> Option<Rc<dyn EntityDelegate>> {
        self.0.delegate.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_delegate(&self, delegate: Option<Weak<dyn EntityDelegate>>) {
        *self.0.delegate.borrow_mut() = delegate;
    }

    /// Number of components, relays included
    pub fn component_count(&self) -> usize {
        self.0.components.borrow().len()
    }

    /// Snapshot of all components in insertion order
    pub fn components(&self) -> Vec<ComponentHandle> {
        self.0.components.borrow().clone()
    }

    /// Whether this exact instance is stored here
    pub fn contains(&self, component: &ComponentHandle) -> bool {
        self.0.components.borrow().iter().any(|c| c.ptr_eq(component))
    }

    /// Whether a component of exact type `T` is stored here
    pub fn has_component<T: Component>(&self) -> bool {
        self.component::<T>().is_some()
    }

    /// Component of exact type `T`, relays not considered
    pub fn component<T: Component>(&self) -> Option<ComponentHandle> {
        self.component_by_key(ComponentKey::of::<T>())
    }

    /// Component with exact key, relays not considered
    pub fn component_by_key(&self, key: ComponentKey) -> Option<ComponentHandle> {
        self.0.components.borrow().iter().find(|c| c.key() == key).cloned()
    }

    /// Component of type `T`, or the target of a relay to `T`
    ///
    /// A direct component always wins over a relay to the same type.
    pub fn component_or_relay<T: Component>(&self) -> Option<ComponentHandle> {
        self.component_or_relay_by_key(ComponentKey::of::<T>())
    }

    /// Key-based form of [`component_or_relay`](Self::component_or_relay)
    pub fn component_or_relay_by_key(&self, key: ComponentKey) -> Option<ComponentHandle> {
        if let Some(direct) = self.component_by_key(key) {
            return Some(direct);
        }

        let relays: Vec<ComponentHandle> = self
            .0
            .components
            .borrow()
            .iter()
            .filter(|c| c.relay_key() == Some(key))
            .cloned()
            .collect();

        let target = relays.iter().find_map(|relay| relay.resolve_relay(self));
        if target.is_none() && !relays.is_empty() {
            log::debug!("{}: relay to {} does not resolve to a component", self, key);
        }
        target
    }

    /// Read the component of type `T`, resolving relays
    pub fn with_component<T: Component, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.component_or_relay::<T>()?.with(f)
    }

    /// Modify the component of type `T`, resolving relays
    pub fn with_component_mut<T: Component, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.component_or_relay::<T>()?.with_mut(f)
    }

    /// Wrap and add a component value, returning its handle
    pub fn insert<T: Component>(&self, component: T) -> ComponentHandle {
        let handle = ComponentHandle::new(component);
        self.add_component(handle.clone());
        handle
    }

    /// Add a component
    ///
    /// A component owned by another entity is moved here. A component of the
    /// same type already on this entity is detached and replaced. Adding the
    /// instance that is already stored does nothing.
    pub fn add_component(&self, component: ComponentHandle) {
        if let Some(owner) = component.entity() {
            if owner == *self && self.contains(&component) {
                log::debug!("{} already holds this {}; ignoring re-add", self, component.key());
                return;
            }
            if owner != *self {
                owner.remove_component_handle(&component);
            }
        }

        let key = component.key();
        if let Some(existing) = self.component_by_key(key) {
            log::warn!("{} already has a {}; replacing it", self, key);
            self.remove_component_handle(&existing);
        }

        self.0.components.borrow_mut().push(component.clone());
        component.set_entity(Some(self));
        component.notify_added(self);

        if let Some(delegate) = self.delegate() {
            delegate.component_added(self, &component);
        }
    }

    /// Add several components in order
    pub fn add_components(&self, components: impl IntoIterator<Item = ComponentHandle>) {
        for component in components {
            self.add_component(component);
        }
    }

    /// Remove the component of exact type `T`, returning it
    pub fn remove_component<T: Component>(&self) -> Option<ComponentHandle> {
        self.remove_component_by_key(ComponentKey::of::<T>())
    }

    /// Remove the component with the exact key, returning it
    pub fn remove_component_by_key(&self, key: ComponentKey) -> Option<ComponentHandle> {
        let Some(component) = self.component_by_key(key) else {
            log::debug!("{} has no {} to remove", self, key);
            return None;
        };
        self.remove_component_handle(&component);
        Some(component)
    }

    pub(crate) fn remove_component_handle(&self, component: &ComponentHandle) {
        if !self.contains(component) {
            log::debug!("{} does not hold this {}", self, component.key());
            return;
        }

        component.notify_will_remove(self);
        if let Some(delegate) = self.delegate() {
            delegate.component_will_be_removed(self, component);
        }

        self.0.components.borrow_mut().retain(|c| !c.ptr_eq(component));
        component.set_entity(None);
    }

    /// Detach every component
    pub fn remove_all_components(&self) {
        for component in self.components() {
            self.remove_component_handle(&component);
        }
    }

    /// Ask the delegate to remove this entity
    pub fn remove_from_delegate(&self) {
        match self.delegate() {
            Some(delegate) => delegate.entity_requested_removal(self),
            None => log::debug!("{} has no delegate to be removed from", self),
        }
    }

    /// Ask the delegate to add `child` next to this entity
    pub fn spawn(&self, child: &Entity) -> bool {
        match self.delegate() {
            Some(delegate) => delegate.entity_spawned(self, child),
            None => {
                log::warn!("{} cannot spawn {} without a delegate", self, child);
                false
            }
        }
    }

    /// First node exposed by any component
    pub fn node(&self) -> Option<NodeRef> {
        self.components().iter().find_map(ComponentHandle::node)
    }

    /// First agent exposed by any component
    pub fn agent(&self) -> Option<AgentRef> {
        self.components().iter().find_map(ComponentHandle::agent)
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.name.borrow().as_deref() {
            Some(name) => write!(f, "Entity#{} \"{}\"", self.0.id, name),
            None => write!(f, "Entity#{}", self.0.id),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<ComponentKey> = self.0.components.borrow().iter().map(ComponentHandle::key).collect();
        f.debug_struct("Entity")
            .field("id", &self.0.id)
            .field("name", &self.0.name.borrow())
            .field("components", &keys)
            .finish()
    }
}
