//! Relay components
//!
//! A relay lets one entity stand in for a component that lives on another
//! entity, typically a global input or time component owned by the game
//! coordinator. The relay is stored under its own concrete type
//! (`RelayComponent<T>`) while [`Entity::component_or_relay`] resolves it under
//! `T`. A direct `T` on the same entity always takes precedence.
//!
//! Relays never own their target's lifecycle: removing a relay leaves the
//! target untouched, and a direct relay keeps pointing at its target even
//! after that target has been detached from its entity.
//!
//! [`Entity::component_or_relay`]: super::Entity::component_or_relay

use std::fmt;
use std::marker::PhantomData;

use super::component::{Component, ComponentContext, ComponentHandle, ComponentKey};

enum RelaySource {
    /// A specific instance, wherever it lives
    Direct(ComponentHandle),
    /// Whatever `T` the scene's root entity holds at lookup time
    SceneEntity,
}

/// Stand-in for a `T` living on another entity
pub struct RelayComponent<T: Component> {
    source: RelaySource,
    _target: PhantomData<fn() -> T>,
}

impl<T: Component> RelayComponent<T> {
    /// Relay to a specific component instance
    ///
    /// Falls back to a scene-entity lookup if `target` does not hold a `T`.
    pub fn direct(target: ComponentHandle) -> Self {
        if target.is::<T>() {
            Self {
                source: RelaySource::Direct(target),
                _target: PhantomData,
            }
        } else {
            log::warn!(
                "relay for {} was given a {}; falling back to the scene entity",
                ComponentKey::of::<T>(),
                target.key()
            );
            Self::scene_component()
        }
    }

    /// Relay to the `T` on the scene's root entity, resolved on each access
    pub fn scene_component() -> Self {
        Self {
            source: RelaySource::SceneEntity,
            _target: PhantomData,
        }
    }

    /// The directly wrapped component, if this relay holds one
    pub fn direct_target(&self) -> Option<&ComponentHandle> {
        match &self.source {
            RelaySource::Direct(handle) => Some(handle),
            RelaySource::SceneEntity => None,
        }
    }

    /// Resolve the target
    ///
    /// Order: the direct reference, then the scene entity's `T` by exact type.
    /// Scene lookups never follow further relays, so two relays can not bounce
    /// a lookup back and forth.
    pub fn resolve(&self, ctx: &ComponentContext<'_>) -> Option<ComponentHandle> {
        if let Some(direct) = self.direct_target() {
            return Some(direct.clone());
        }
        ctx.scene_entity()?.component_by_key(ComponentKey::of::<T>())
    }
}

impl<T: Component> Component for RelayComponent<T> {
    fn relay_target_key(&self) -> Option<ComponentKey> {
        Some(ComponentKey::of::<T>())
    }

    fn relay_target(&self, ctx: &ComponentContext<'_>) -> Option<ComponentHandle> {
        self.resolve(ctx)
    }
}

impl<T: Component> fmt::Debug for RelayComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            RelaySource::Direct(_) => "direct",
            RelaySource::SceneEntity => "scene entity",
        };
        f.debug_struct("RelayComponent")
            .field("target", &ComponentKey::of::<T>())
            .field("source", &source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;

    #[derive(Debug, Default)]
    struct Input {
        pressed: bool,
    }
    impl Component for Input {}

    #[derive(Debug, Default)]
    struct Score(u32);
    impl Component for Score {}

    #[test]
    fn test_relay_resolves_direct_target() {
        let global = Entity::named("coordinator");
        let input = global.insert(Input::default());

        let player = Entity::named("player");
        player.insert(RelayComponent::<Input>::direct(input.clone()));

        let resolved = player.component_or_relay::<Input>().unwrap();
        assert!(resolved.ptr_eq(&input));
        // Exact lookups do not see through relays
        assert!(player.component::<Input>().is_none());
        assert!(player.has_component::<RelayComponent<Input>>());
    }

    #[test]
    fn test_writes_through_relay_are_shared() {
        let global = Entity::new();
        let input = global.insert(Input::default());
        let player = Entity::new();
        player.insert(RelayComponent::<Input>::direct(input));

        player.with_component_mut(|i: &mut Input| i.pressed = true);
        assert_eq!(global.with_component(|i: &Input| i.pressed), Some(true));
    }

    #[test]
    fn test_direct_component_beats_relay() {
        let global = Entity::new();
        let shared = global.insert(Input::default());

        let entity = Entity::new();
        entity.insert(RelayComponent::<Input>::direct(shared.clone()));
        let own = entity.insert(Input { pressed: true });

        let resolved = entity.component_or_relay::<Input>().unwrap();
        assert!(resolved.ptr_eq(&own));
        assert!(!resolved.ptr_eq(&shared));
    }

    #[test]
    fn test_relay_survives_target_detachment() {
        let global = Entity::new();
        let input = global.insert(Input::default());
        let client = Entity::new();
        client.insert(RelayComponent::<Input>::direct(input.clone()));

        input.remove_from_entity();

        assert!(input.entity().is_none());
        let resolved = client.component_or_relay::<Input>().unwrap();
        assert!(resolved.ptr_eq(&input));
    }

    #[test]
    fn test_removing_relay_leaves_target() {
        let global = Entity::new();
        let input = global.insert(Input::default());
        let client = Entity::new();
        client.insert(RelayComponent::<Input>::direct(input.clone()));

        client.remove_component::<RelayComponent<Input>>();

        assert!(client.component_or_relay::<Input>().is_none());
        assert_eq!(input.entity(), Some(global));
    }

    #[test]
    fn test_mismatched_direct_target_falls_back() {
        let score = ComponentHandle::new(Score(3));
        let relay = RelayComponent::<Input>::direct(score);
        assert!(relay.direct_target().is_none());

        // Without a scene there is nothing to fall back to
        let entity = Entity::new();
        entity.insert(relay);
        assert!(entity.component_or_relay::<Input>().is_none());
    }
}
