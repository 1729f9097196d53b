//! Arcade demo application
//!
//! Runs a headless title -> play -> pause -> game over loop on a fixed-step
//! host clock. Pass a TOML or RON engine configuration file as the first
//! argument to override the defaults.

mod components;
mod states;

use octo_engine::prelude::*;

use components::{InputComponent, ScoreComponent, ScoreLog, ScriptedInput, ShipControlComponent};
use states::Phase;

const FRAME: f64 = 1.0 / 60.0;
const SEED: u64 = 0x0c70;

fn engine() -> Result<Engine<Phase>, EngineError> {
    match std::env::args().nth(1) {
        Some(path) => Engine::from_config_file(path),
        None => Engine::new(
            EngineConfig::default().with_clock(ClockConfig::default().with_fixed_step(FRAME)),
        ),
    }
}

fn coordinator() -> Result<GameCoordinator<Phase>, TransitionError<Phase>> {
    let mut coordinator = GameCoordinator::new(states::machine()?);

    let global = coordinator.entity();
    global.insert(TimeComponent::new());
    global.insert(InputComponent::default());
    global.insert(ScriptedInput::seeded(SEED));
    global.insert(ScoreComponent::with_observer(0, ScoreLog));

    coordinator.register_scene("title", states::title_scene);
    coordinator.register_scene("play", |entity: &Entity| states::play_scene(entity, SEED));
    Ok(coordinator)
}

/// What the scripted session does at a given time
fn scripted_request(time: f64) -> Option<Phase> {
    match (time / FRAME).round() as u64 {
        30 => Some(Phase::Play),
        180 => Some(Phase::Paused),
        // Mashing pause again while paused is rejected and logged
        181 => Some(Phase::Paused),
        240 => Some(Phase::Play),
        420 => Some(Phase::GameOver),
        480 => Some(Phase::Title),
        _ => None,
    }
}

fn report(engine: &Engine<Phase>) {
    let Some(coordinator) = engine.coordinator() else {
        return;
    };
    let Some(scene) = coordinator.current_scene() else {
        return;
    };
    let shots = scene
        .entities_named("ship")
        .first()
        .and_then(|ship| ship.with_component(|control: &ShipControlComponent| control.shots_fired()));
    log::info!(
        "{:?} in '{}': {} entities, {} frames, paused {:?}, shots {:?}, overlay {:?}",
        coordinator.current_state(),
        scene.name(),
        scene.entity_count(),
        scene.frame_count(),
        scene.pause_flags(),
        shots,
        coordinator.current_ui().map(|ui| ui.title.as_str())
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = engine()?;
    engine.start(coordinator()?)?;
    log::info!("Starting arcade demo");

    for frame in 0..540_u32 {
        let time = f64::from(frame) * FRAME;
        if let Some(next) = scripted_request(time) {
            report(&engine);
            engine.request_transition(next)?;
        }
        engine.tick(time)?;
    }
    report(&engine);

    let coordinator = engine.shutdown()?;
    let elapsed = coordinator
        .entity()
        .with_component(|time: &TimeComponent| time.elapsed())
        .unwrap_or_default();
    let score = coordinator
        .entity()
        .with_component(|score: &ScoreComponent| *score.value())
        .unwrap_or_default();
    log::info!("Session finished after {:.2}s of game time; last score {}", elapsed, score);
    Ok(())
}
