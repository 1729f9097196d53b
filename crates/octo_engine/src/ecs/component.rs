//! Component trait and the shared handle that stores component instances
//!
//! Components are plain Rust values implementing [`Component`]. Once wrapped in
//! a [`ComponentHandle`] they can be attached to an [`Entity`], tracked by a
//! [`ComponentSystem`](super::ComponentSystem) and referenced by relays on
//! other entities. The handle carries the non-owning back-reference to the
//! entity; the component value itself never owns its entity.

use std::any::{Any, TypeId};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::components::AgentRef;
use super::entity::{Entity, WeakEntity};
use crate::scene::NodeRef;

/// Stable runtime identifier for a concrete component type
///
/// Equality and hashing only look at the `TypeId`; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct ComponentKey {
    id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Key of the concrete type `T`
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Underlying `TypeId`
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Full type name, including module path
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths, for log messages
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from every segment of a type name
///
/// `octo_engine::ecs::relay::RelayComponent<game::Input>` becomes
/// `RelayComponent<Input>`.
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}

/// Upcast helper so handles can downcast type-erased components
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-entity behavior and state
///
/// Every hook has a default so simple data components only need an empty
/// `impl Component for MyData {}`.
pub trait Component: AsAny {
    /// Advance this component by `delta_time` seconds
    ///
    /// Only called for components whose type has a
    /// [`ComponentSystem`](super::ComponentSystem) in the active scene.
    fn update(&mut self, _ctx: &ComponentContext<'_>, _delta_time: f64) {}

    /// Called once after the owning-entity back-reference is set
    fn did_add_to_entity(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Called once before the owning-entity back-reference is cleared
    fn will_remove_from_entity(&mut self, _ctx: &ComponentContext<'_>) {}

    /// Sibling types this component needs on its entity to do anything
    fn required_component_types(&self) -> Vec<ComponentKey> {
        Vec::new()
    }

    /// Wrapped component type, for relay components only
    fn relay_target_key(&self) -> Option<ComponentKey> {
        None
    }

    /// Resolve the relayed component, for relay components only
    fn relay_target(&self, _ctx: &ComponentContext<'_>) -> Option<ComponentHandle> {
        None
    }

    /// Drawable/positionable object associated with this component
    fn node(&self) -> Option<NodeRef> {
        None
    }

    /// Steering agent associated with this component
    fn agent(&self) -> Option<AgentRef> {
        None
    }
}

struct ComponentCell {
    key: ComponentKey,
    relay_key: Option<ComponentKey>,
    required: Vec<ComponentKey>,
    entity: RefCell<WeakEntity>,
    dependency_warning_issued: Cell<bool>,
    inner: RefCell<Box<dyn Component>>,
}

/// Shared handle to one component instance
///
/// Cloning the handle does not clone the component. A component belongs to
/// at most one entity at a time; the handle's back-reference is weak.
#[derive(Clone)]
pub struct ComponentHandle(Rc<ComponentCell>);

impl ComponentHandle {
    /// Wrap a component value
    pub fn new<T: Component>(component: T) -> Self {
        let relay_key = component.relay_target_key();
        let required = component.required_component_types();
        Self(Rc::new(ComponentCell {
            key: ComponentKey::of::<T>(),
            relay_key,
            required,
            entity: RefCell::new(WeakEntity::new()),
            dependency_warning_issued: Cell::new(false),
            inner: RefCell::new(Box::new(component)),
        }))
    }

    /// Concrete type key of the wrapped component
    pub fn key(&self) -> ComponentKey {
        self.0.key
    }

    /// Wrapped type key if this handle holds a relay
    pub fn relay_key(&self) -> Option<ComponentKey> {
        self.0.relay_key
    }

    /// Whether the handle wraps a `T`
    pub fn is<T: Component>(&self) -> bool {
        self.0.key == ComponentKey::of::<T>()
    }

    /// Owning entity, if the component is attached and the entity is alive
    pub fn entity(&self) -> Option<Entity> {
        self.0.entity.borrow().upgrade()
    }

    pub(crate) fn set_entity(&self, entity: Option<&Entity>) {
        *self.0.entity.borrow_mut() = entity.map_or_else(WeakEntity::new, Entity::downgrade);
        if entity.is_none() {
            self.0.dependency_warning_issued.set(false);
        }
    }

    /// Same instance check
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the component as `T`
    ///
    /// Returns `None` when the type does not match or the component is
    /// currently mutably borrowed (for example while it is updating).
    pub fn borrow<T: Component>(&self) -> Option<Ref<'_, T>> {
        let inner = self.0.inner.try_borrow().ok()?;
        Ref::filter_map(inner, |boxed| (**boxed).as_any().downcast_ref::<T>()).ok()
    }

    /// Mutably borrow the component as `T`
    pub fn borrow_mut<T: Component>(&self) -> Option<RefMut<'_, T>> {
        let inner = self.0.inner.try_borrow_mut().ok()?;
        RefMut::filter_map(inner, |boxed| (**boxed).as_any_mut().downcast_mut::<T>()).ok()
    }

    /// Run a closure against the component as `T`
    pub fn with<T: Component, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.borrow::<T>().map(|component| f(&component))
    }

    /// Run a closure against the component as `&mut T`
    pub fn with_mut<T: Component, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.borrow_mut::<T>().map(|mut component| f(&mut component))
    }

    /// Detach the component from whichever entity holds it
    pub fn remove_from_entity(&self) {
        match self.entity() {
            Some(entity) => entity.remove_component_handle(self),
            None => log::debug!("{} is not attached to an entity", self.key()),
        }
    }

    /// Whether every required co-component is present on the owning entity
    ///
    /// Always false for a component that has no entity.
    pub fn check_required_components(&self) -> bool {
        self.entity()
            .is_some_and(|entity| self.missing_required_components(&entity).is_empty())
    }

    fn missing_required_components(&self, entity: &Entity) -> Vec<ComponentKey> {
        self.0
            .required
            .iter()
            .copied()
            .filter(|key| *key == self.0.key || entity.component_or_relay_by_key(*key).is_none())
            .collect()
    }

    /// Node exposed by the component, if any
    pub fn node(&self) -> Option<NodeRef> {
        self.0.inner.try_borrow().ok().and_then(|inner| inner.node())
    }

    /// Agent exposed by the component, if any
    pub fn agent(&self) -> Option<AgentRef> {
        self.0.inner.try_borrow().ok().and_then(|inner| inner.agent())
    }

    /// Resolve this relay's target in the context of `entity`
    pub(crate) fn resolve_relay(&self, entity: &Entity) -> Option<ComponentHandle> {
        self.0.relay_key?;
        let Ok(inner) = self.0.inner.try_borrow() else {
            log::debug!("{} is busy; skipping relay resolution", self.key());
            return None;
        };
        let ctx = ComponentContext::new(entity, self.0.key);
        inner.relay_target(&ctx)
    }

    pub(crate) fn notify_added(&self, entity: &Entity) {
        let missing = self.missing_required_components(entity);
        if !missing.is_empty() && !self.0.dependency_warning_issued.replace(true) {
            log::warn!(
                "{} added to {} without required components {:?}; it will stay inert until they are present",
                self.key(),
                entity,
                missing
            );
        }

        match self.0.inner.try_borrow_mut() {
            Ok(mut inner) => inner.did_add_to_entity(&ComponentContext::new(entity, self.0.key)),
            Err(_) => log::warn!("{} is busy; skipped its added-to-entity hook", self.key()),
        }
    }

    pub(crate) fn notify_will_remove(&self, entity: &Entity) {
        match self.0.inner.try_borrow_mut() {
            Ok(mut inner) => inner.will_remove_from_entity(&ComponentContext::new(entity, self.0.key)),
            Err(_) => log::warn!("{} is busy; skipped its will-remove hook", self.key()),
        }
    }

    /// Run one frame of this component
    pub(crate) fn update(&self, delta_time: f64) {
        let Some(entity) = self.entity() else {
            log::trace!("{} has no entity; not updating", self.key());
            return;
        };

        if !self.0.required.is_empty() && !self.missing_required_components(&entity).is_empty() {
            log::trace!("{} on {} is missing dependencies; skipping update", self.key(), entity);
            return;
        }

        match self.0.inner.try_borrow_mut() {
            Ok(mut inner) => inner.update(&ComponentContext::new(&entity, self.0.key), delta_time),
            Err(_) => log::warn!("{} is already borrowed; skipped re-entrant update", self.key()),
        }
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("ComponentHandle");
        dbg.field("type", &self.0.key);
        if let Some(relay) = self.0.relay_key {
            dbg.field("relays", &relay);
        }
        dbg.field("entity", &self.entity().map(|e| e.id()));
        dbg.finish()
    }
}

/// What a component hook sees of the world
///
/// Co-component lookups go through the owning entity and never return the
/// caller's own type, so a component cannot accidentally borrow itself.
pub struct ComponentContext<'a> {
    entity: &'a Entity,
    key: ComponentKey,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(entity: &'a Entity, key: ComponentKey) -> Self {
        Self { entity, key }
    }

    /// Owning entity
    pub fn entity(&self) -> &'a Entity {
        self.entity
    }

    /// Key of the component this context was built for
    pub fn own_key(&self) -> ComponentKey {
        self.key
    }

    /// Sibling component of type `T`, resolving relays
    pub fn co_component<T: Component>(&self) -> Option<ComponentHandle> {
        self.co_component_by_key(ComponentKey::of::<T>(), false)
    }

    /// Sibling component of type `T`, ignoring relays
    pub fn co_component_ignoring_relays<T: Component>(&self) -> Option<ComponentHandle> {
        self.co_component_by_key(ComponentKey::of::<T>(), true)
    }

    /// Sibling component by key
    pub fn co_component_by_key(&self, key: ComponentKey, ignore_relays: bool) -> Option<ComponentHandle> {
        if key == self.key {
            return None;
        }
        if ignore_relays {
            self.entity.component_by_key(key)
        } else {
            self.entity.component_or_relay_by_key(key)
        }
    }

    /// Read a sibling component of type `T`
    pub fn with_co_component<T: Component, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.co_component::<T>()?.with(f)
    }

    /// Modify a sibling component of type `T`
    pub fn with_co_component_mut<T: Component, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.co_component::<T>()?.with_mut(f)
    }

    /// Well-known scene-level entity of the scene this entity belongs to
    pub fn scene_entity(&self) -> Option<Entity> {
        self.entity.delegate()?.scene_entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Health(u32);
    impl Component for Health {}

    #[derive(Debug, Default)]
    struct Armor;
    impl Component for Armor {}

    #[test]
    fn test_component_key_identity() {
        assert_eq!(ComponentKey::of::<Health>(), ComponentKey::of::<Health>());
        assert_ne!(ComponentKey::of::<Health>(), ComponentKey::of::<Armor>());
        assert_eq!(ComponentKey::of::<Health>().short_name(), "Health");
    }

    #[test]
    fn test_short_type_name_generics() {
        assert_eq!(
            short_type_name("octo_engine::ecs::relay::RelayComponent<game::input::Input>"),
            "RelayComponent<Input>"
        );
        assert_eq!(short_type_name("u32"), "u32");
    }

    #[test]
    fn test_handle_downcast() {
        let handle = ComponentHandle::new(Health(7));
        assert!(handle.is::<Health>());
        assert_eq!(handle.with(|h: &Health| h.0), Some(7));
        assert!(handle.borrow::<Armor>().is_none());

        handle.with_mut(|h: &mut Health| h.0 += 1);
        assert_eq!(handle.borrow::<Health>().map(|h| h.0), Some(8));
    }

    #[test]
    fn test_borrow_fails_soft_while_mutably_borrowed() {
        let handle = ComponentHandle::new(Health(1));
        let guard = handle.borrow_mut::<Health>();
        assert!(guard.is_some());
        assert!(handle.borrow::<Health>().is_none());
        drop(guard);
        assert!(handle.borrow::<Health>().is_some());
    }

    #[test]
    fn test_detached_component_has_no_entity() {
        let handle = ComponentHandle::new(Armor);
        assert!(handle.entity().is_none());
        assert!(!handle.check_required_components());
        // Removing a detached component is a no-op
        handle.remove_from_entity();
    }
}
