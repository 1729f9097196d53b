//! Whole-frame scene behavior: system ordering, pausing, structural changes
//! made during a frame and scene-entity relays

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::ecs::components::{LifetimeComponent, TimeComponent};
use crate::ecs::{Component, ComponentContext, ComponentKey, Entity, RelayComponent};
use crate::scene::Scene;

type Shared = Rc<Cell<i32>>;

/// Writes the frame's value
struct Writer(Shared);
impl Component for Writer {
    fn update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
        self.0.set(self.0.get() + 10);
    }
}

/// Reads whatever the writer produced this frame
struct Reader {
    shared: Shared,
    seen: Vec<i32>,
}
impl Component for Reader {
    fn update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
        self.seen.push(self.shared.get());
    }
}

/// Counts its updates
#[derive(Default)]
struct Ticks(u32);
impl Component for Ticks {
    fn update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
        self.0 += 1;
    }
}

/// Counts its updates; kept alive while paused in some tests
#[derive(Default)]
struct MenuInput(u32);
impl Component for MenuInput {
    fn update(&mut self, _ctx: &ComponentContext<'_>, _dt: f64) {
        self.0 += 1;
    }
}

/// Spawns one child entity on its first update
struct Spawner {
    spawned: Rc<RefCell<Option<Entity>>>,
}
impl Component for Spawner {
    fn update(&mut self, ctx: &ComponentContext<'_>, _dt: f64) {
        if self.spawned.borrow().is_some() {
            return;
        }
        let child = Entity::named("spawned");
        child.insert(Ticks::default());
        ctx.entity().spawn(&child);
        *self.spawned.borrow_mut() = Some(child);
    }
}

/// Records the scene-wide elapsed time seen through a relay
#[derive(Default)]
struct Clocked(Vec<f64>);
impl Component for Clocked {
    fn update(&mut self, ctx: &ComponentContext<'_>, _dt: f64) {
        if let Some(elapsed) = ctx.with_co_component(|t: &TimeComponent| t.elapsed()) {
            self.0.push(elapsed);
        }
    }
}

fn ticks(entity: &Entity) -> u32 {
    entity.with_component(|t: &Ticks| t.0).unwrap()
}

#[test]
fn test_earlier_system_writes_are_visible_to_later_systems() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<Writer>(), ComponentKey::of::<Reader>()]);

    let shared = Shared::default();
    let reader_entity = Entity::named("reader");
    reader_entity.insert(Reader {
        shared: Rc::clone(&shared),
        seen: Vec::new(),
    });
    let writer_entity = Entity::named("writer");
    writer_entity.insert(Writer(Rc::clone(&shared)));
    // The reader's entity is added first; system order still wins
    scene.add_entities([&reader_entity, &writer_entity]);

    scene.update(0.016);
    scene.update(0.016);

    let seen = reader_entity.with_component(|r: &Reader| r.seen.clone()).unwrap();
    assert_eq!(seen, vec![10, 20]);
}

#[test]
fn test_members_update_in_entity_order() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<Reader>()]);
    let shared = Shared::default();

    let entities: Vec<Entity> = (0..3)
        .map(|i| {
            let entity = Entity::named(format!("reader {i}"));
            entity.insert(Reader {
                shared: Rc::clone(&shared),
                seen: Vec::new(),
            });
            scene.add_entity(&entity);
            entity
        })
        .collect();

    let system = scene.component_system(ComponentKey::of::<Reader>()).unwrap();
    for (member, entity) in system.components().iter().zip(&entities) {
        assert_eq!(member.entity().as_ref(), Some(entity));
    }
}

#[test]
fn test_pause_short_circuits_every_system() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<Ticks>(), ComponentKey::of::<MenuInput>()]);
    let entity = Entity::new();
    entity.insert(Ticks::default());
    entity.insert(MenuInput::default());
    scene.add_entity(&entity);

    scene.update(0.016);
    let frames = scene.frame_count();

    for pause in [
        Scene::set_paused_by_system as fn(&Scene, bool),
        Scene::set_paused_by_player,
        Scene::set_paused_by_subscene,
    ] {
        pause(&scene, true);
        scene.update(0.016);
        scene.update(0.016);
        pause(&scene, false);
    }

    assert_eq!(ticks(&entity), 1);
    assert_eq!(entity.with_component(|m: &MenuInput| m.0), Some(1));
    assert_eq!(scene.frame_count(), frames);
}

#[test]
fn test_systems_kept_alive_while_paused() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<Ticks>(), ComponentKey::of::<MenuInput>()]);
    scene.set_systems_active_while_paused([ComponentKey::of::<MenuInput>()]);
    let entity = Entity::new();
    entity.insert(Ticks::default());
    entity.insert(MenuInput::default());
    scene.add_entity(&entity);

    scene.set_paused_by_player(true);
    scene.update(0.016);
    scene.update(0.016);

    assert_eq!(ticks(&entity), 0);
    assert_eq!(entity.with_component(|m: &MenuInput| m.0), Some(2));
}

#[test]
fn test_spawned_entities_update_from_next_frame() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<Spawner>(), ComponentKey::of::<Ticks>()]);
    let spawned = Rc::new(RefCell::new(None));
    let parent = Entity::named("spawner");
    parent.insert(Spawner {
        spawned: Rc::clone(&spawned),
    });
    scene.add_entity(&parent);

    scene.update(0.016);
    let child = spawned.borrow().clone().unwrap();
    assert!(scene.contains(&child));
    assert_eq!(ticks(&child), 0);

    scene.update(0.016);
    assert_eq!(ticks(&child), 1);
}

#[test]
fn test_expired_lifetime_removes_entity_after_frame() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<LifetimeComponent>(), ComponentKey::of::<Ticks>()]);
    let bullet = Entity::named("bullet");
    bullet.insert(LifetimeComponent::new(0.02));
    let ticks_handle = bullet.insert(Ticks::default());
    scene.add_entity(&bullet);

    scene.update(0.016);
    assert!(scene.contains(&bullet));

    scene.update(0.016);
    // Removal waits for the frame to finish, so later systems still ran
    assert_eq!(ticks_handle.with(|t: &Ticks| t.0), Some(2));
    assert!(!scene.contains(&bullet));
    assert_eq!(bullet.component_count(), 0);
    assert!(scene.component_system(ComponentKey::of::<Ticks>()).unwrap().is_empty());
}

#[test]
fn test_scene_relay_reads_scene_entity() {
    let scene = Scene::new("arena");
    scene.set_component_systems([ComponentKey::of::<TimeComponent>(), ComponentKey::of::<Clocked>()]);
    scene.entity().insert(TimeComponent::new());

    let ship = Entity::named("ship");
    ship.insert(RelayComponent::<TimeComponent>::scene_component());
    ship.insert(Clocked::default());
    scene.add_entity(&ship);

    scene.update(0.5);
    scene.update(0.25);

    let seen = ship.with_component(|c: &Clocked| c.0.clone()).unwrap();
    assert_eq!(seen, vec![0.5, 0.75]);
}

#[test]
fn test_scene_relay_outside_scene_resolves_nothing() {
    let ship = Entity::named("ship");
    ship.insert(RelayComponent::<TimeComponent>::scene_component());
    assert!(ship.component_or_relay::<TimeComponent>().is_none());
}

#[test]
fn test_scene_relay_does_not_follow_relays_on_scene_entity() {
    let scene = Scene::new("arena");
    scene.entity().insert(RelayComponent::<TimeComponent>::scene_component());

    let ship = Entity::named("ship");
    ship.insert(RelayComponent::<TimeComponent>::scene_component());
    scene.add_entity(&ship);

    assert!(ship.component_or_relay::<TimeComponent>().is_none());
    assert!(scene.entity().component_or_relay::<TimeComponent>().is_none());
}

#[test]
fn test_relay_to_relay_type_is_not_unwrapped() {
    let scene = Scene::new("arena");
    scene.entity().insert(RelayComponent::<TimeComponent>::scene_component());

    let ship = Entity::named("ship");
    ship.insert(RelayComponent::<RelayComponent<TimeComponent>>::scene_component());
    scene.add_entity(&ship);

    let outer = ship.component_or_relay::<RelayComponent<TimeComponent>>().unwrap();
    assert!(outer.is::<RelayComponent<TimeComponent>>());
    assert!(ship.component_or_relay::<TimeComponent>().is_none());
}
