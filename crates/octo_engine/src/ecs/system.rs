//! Component systems
//!
//! A `ComponentSystem` collects every component of one concrete type across
//! the entities of a scene and updates them together. Scenes keep their
//! systems in a caller-declared order; that order is part of gameplay
//! behavior because later systems read what earlier ones wrote this frame.

use super::component::{Component, ComponentHandle, ComponentKey};
use super::entity::Entity;

/// Ordered batch of components of one type
#[derive(Debug, Clone)]
pub struct ComponentSystem {
    key: ComponentKey,
    components: Vec<ComponentHandle>,
}

impl ComponentSystem {
    /// Create an empty system tracking `key`
    pub fn new(key: ComponentKey) -> Self {
        Self {
            key,
            components: Vec::new(),
        }
    }

    /// Create an empty system tracking `T`
    pub fn of<T: Component>() -> Self {
        Self::new(ComponentKey::of::<T>())
    }

    /// Tracked component type
    pub fn key(&self) -> ComponentKey {
        self.key
    }

    /// Number of member components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the system has no members
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Members in the order their entities were added
    pub fn components(&self) -> &[ComponentHandle] {
        &self.components
    }

    /// Whether this exact instance is a member
    pub fn contains(&self, component: &ComponentHandle) -> bool {
        self.components.iter().any(|c| c.ptr_eq(component))
    }

    /// Append a component of the tracked type
    ///
    /// Exact type match only. Returns false for other types and for an
    /// instance that is already a member.
    pub fn add_component(&mut self, component: ComponentHandle) -> bool {
        if component.key() != self.key {
            return false;
        }
        if self.contains(&component) {
            log::debug!("{} system already tracks this component", self.key);
            return false;
        }
        self.components.push(component);
        true
    }

    /// Add the tracked component found on `entity`, if any
    pub fn add_components_found_in(&mut self, entity: &Entity) -> bool {
        entity
            .component_by_key(self.key)
            .is_some_and(|component| self.add_component(component))
    }

    /// Remove a specific member
    pub fn remove_component(&mut self, component: &ComponentHandle) -> bool {
        let before = self.components.len();
        self.components.retain(|c| !c.ptr_eq(component));
        before != self.components.len()
    }

    /// Remove the member owned by `entity`
    pub fn remove_component_matching_entity(&mut self, entity: &Entity) -> bool {
        let position = self
            .components
            .iter()
            .position(|c| c.entity().as_ref() == Some(entity));
        match position {
            Some(index) => {
                self.components.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every member
    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Update every member in order
    ///
    /// Iterates a snapshot, so members added or removed by an update take
    /// effect from the next call.
    pub fn update(&self, delta_time: f64) {
        let snapshot = self.components.clone();
        log::trace!("updating {} system ({} members)", self.key, snapshot.len());
        for component in &snapshot {
            component.update(delta_time);
        }
    }
}

/// Update systems in declared order, then members in addition order
pub fn update_systems(systems: &[ComponentSystem], delta_time: f64) {
    for system in systems {
        system.update(delta_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentContext;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Trace = Rc<RefCell<Vec<String>>>;

    struct Tagged {
        tag: &'static str,
        trace: Trace,
    }
    impl Component for Tagged {
        fn update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
            self.trace.borrow_mut().push(self.tag.to_string());
        }
    }

    struct Other;
    impl Component for Other {}

    fn tagged(tag: &'static str, trace: &Trace) -> ComponentHandle {
        ComponentHandle::new(Tagged {
            tag,
            trace: Rc::clone(trace),
        })
    }

    #[test]
    fn test_exact_type_membership() {
        let mut system = ComponentSystem::of::<Tagged>();
        let trace = Trace::default();

        assert!(system.add_component(tagged("a", &trace)));
        assert!(!system.add_component(ComponentHandle::new(Other)));
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_duplicate_add_is_idempotent() {
        let mut system = ComponentSystem::of::<Tagged>();
        let trace = Trace::default();
        let handle = tagged("a", &trace);

        assert!(system.add_component(handle.clone()));
        assert!(!system.add_component(handle));
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_updates_follow_addition_order() {
        let trace = Trace::default();
        let mut system = ComponentSystem::of::<Tagged>();
        let mut entities = Vec::new();
        for tag in ["first", "second", "third"] {
            let entity = Entity::new();
            let handle = tagged(tag, &trace);
            entity.add_component(handle.clone());
            system.add_component(handle);
            entities.push(entity);
        }

        system.update(0.016);

        assert_eq!(*trace.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_detached_members_are_skipped() {
        let trace = Trace::default();
        let mut system = ComponentSystem::of::<Tagged>();
        system.add_component(tagged("orphan", &trace));

        system.update(0.016);

        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn test_remove_matching_entity() {
        let trace = Trace::default();
        let mut system = ComponentSystem::of::<Tagged>();
        let a = Entity::new();
        let b = Entity::new();
        let ha = tagged("a", &trace);
        let hb = tagged("b", &trace);
        a.add_component(ha.clone());
        b.add_component(hb.clone());
        system.add_component(ha);
        system.add_component(hb.clone());

        assert!(system.remove_component_matching_entity(&a));
        assert!(!system.remove_component_matching_entity(&a));
        assert_eq!(system.len(), 1);
        assert!(system.contains(&hb));
    }

    #[test]
    fn test_add_components_found_in() {
        let trace = Trace::default();
        let mut system = ComponentSystem::of::<Tagged>();
        let entity = Entity::new();
        entity.add_component(tagged("a", &trace));

        assert!(system.add_components_found_in(&entity));
        assert!(!system.add_components_found_in(&Entity::new()));
    }

    #[test]
    fn test_update_systems_in_declared_order() {
        let trace = Trace::default();
        let entity = Entity::new();
        let tagged_handle = tagged("tagged", &trace);
        entity.add_component(tagged_handle.clone());

        struct Late(Trace);
        impl Component for Late {
            fn update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
                self.0.borrow_mut().push("late".to_string());
            }
        }
        let late = entity.insert(Late(Rc::clone(&trace)));

        let mut late_system = ComponentSystem::of::<Late>();
        late_system.add_component(late);
        let mut tagged_system = ComponentSystem::of::<Tagged>();
        tagged_system.add_component(tagged_handle);

        update_systems(&[late_system, tagged_system], 0.016);

        assert_eq!(*trace.borrow(), vec!["late", "tagged"]);
    }
}
