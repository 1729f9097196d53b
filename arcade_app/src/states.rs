//! Game phases and the scenes they present

use octo_engine::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::{asteroid, DriftComponent, InputComponent, ScoreComponent, ShipControlComponent};

/// Major phases of the demo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Title screen
    Title,
    /// Flying the ship
    Play,
    /// Player pause over the play scene
    Paused,
    /// Final score screen
    GameOver,
}

/// Table-driven state: allowed successors, scene and overlay
pub struct ArcadeState {
    key: Phase,
    next: &'static [Phase],
    scene: Option<&'static str>,
    overlay: Option<(&'static str, &'static [&'static str])>,
}

impl GameState<Phase> for ArcadeState {
    fn key(&self) -> Phase {
        self.key
    }

    fn is_valid_next_state(&self, next: Phase) -> bool {
        self.next.contains(&next)
    }

    fn did_enter(&mut self, from: Option<Phase>, ctx: &StateContext) {
        match self.key {
            Phase::Paused => {
                if let Some(scene) = &ctx.scene {
                    scene.set_paused_by_player(true);
                }
            }
            Phase::Play if from == Some(Phase::Title) => {
                ctx.entity.with_component_mut(|score: &mut ScoreComponent| score.set(0));
            }
            Phase::GameOver => {
                let score = ctx.entity.with_component(|score: &ScoreComponent| *score.value());
                log::info!("game over; final score {}", score.unwrap_or_default());
            }
            _ => {}
        }
    }

    fn will_exit(&mut self, _to: Phase, ctx: &StateContext) {
        if self.key == Phase::Paused {
            if let Some(scene) = &ctx.scene {
                scene.set_paused_by_player(false);
            }
        }
    }

    fn scene(&self) -> Option<SceneDescriptor> {
        self.scene.map(SceneDescriptor::new)
    }

    fn ui(&self) -> Option<UiDescriptor> {
        self.overlay.map(|(title, items)| {
            items
                .iter()
                .fold(UiDescriptor::new(title), |ui, item| ui.with_item(*item))
        })
    }
}

/// The demo's state machine
pub fn machine() -> Result<StateMachine<Phase>, TransitionError<Phase>> {
    let states: [Box<dyn GameState<Phase>>; 4] = [
        Box::new(ArcadeState {
            key: Phase::Title,
            next: &[Phase::Play],
            scene: Some("title"),
            overlay: Some(("OCTO ARCADE", &["Start", "Quit"])),
        }),
        Box::new(ArcadeState {
            key: Phase::Play,
            next: &[Phase::Paused, Phase::GameOver],
            scene: Some("play"),
            overlay: None,
        }),
        Box::new(ArcadeState {
            key: Phase::Paused,
            next: &[Phase::Play, Phase::GameOver],
            scene: None,
            overlay: Some(("PAUSED", &["Resume", "Give up"])),
        }),
        Box::new(ArcadeState {
            key: Phase::GameOver,
            next: &[Phase::Title],
            scene: Some("title"),
            overlay: Some(("GAME OVER", &["Continue"])),
        }),
    ];
    StateMachine::new(Phase::Title, states)
}

/// Title screen: a banner and nothing to update
pub fn title_scene(_coordinator: &Entity) -> Scene {
    let scene = Scene::new("title");
    let banner = Entity::named("banner");
    banner.insert(NodeComponent::named("banner", Vec2::new(0.0, 40.0)));
    scene.add_entity(&banner);
    scene
}

/// Play field: the ship, a few asteroids and whatever the ship spawns
pub fn play_scene(coordinator: &Entity, seed: u64) -> Scene {
    let scene = Scene::new("play");
    scene.set_component_systems([
        ComponentKey::of::<ShipControlComponent>(),
        ComponentKey::of::<DriftComponent>(),
        ComponentKey::of::<LifetimeComponent>(),
    ]);

    let ship = Entity::named("ship");
    ship.insert(NodeComponent::named("ship", Vec2::zeros()));
    ship.insert(ShipControlComponent::new());
    if let Some(input) = coordinator.component::<InputComponent>() {
        ship.insert(RelayComponent::<InputComponent>::direct(input));
    }
    if let Some(score) = coordinator.component::<ScoreComponent>() {
        ship.insert(RelayComponent::<ScoreComponent>::direct(score));
    }
    scene.add_entity(&ship);

    let mut rng = StdRng::seed_from_u64(seed);
    for index in 0..6 {
        scene.add_entity(&asteroid(&mut rng, index));
    }
    scene
}
