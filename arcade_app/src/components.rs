//! Gameplay components for the arcade demo

use octo_engine::foundation::math::{clamp_length, lerp};
use octo_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Controller state shared by every scene through relays
#[derive(Debug, Default, Clone, Copy)]
pub struct InputComponent {
    /// Turn direction, -1.0 to 1.0
    pub turn: f32,
    /// Thrust held
    pub thrust: bool,
    /// Fire held
    pub fire: bool,
}

impl Component for InputComponent {}

/// Stands in for a gamepad: writes pseudo-random input every frame
pub struct ScriptedInput {
    rng: StdRng,
}

impl ScriptedInput {
    /// Deterministic input stream
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Component for ScriptedInput {
    fn required_component_types(&self) -> Vec<ComponentKey> {
        vec![ComponentKey::of::<InputComponent>()]
    }

    fn update(&mut self, ctx: &ComponentContext<'_>, _delta_time: f64) {
        let turn = self.rng.gen_range(-1.0..=1.0);
        let thrust = self.rng.gen_bool(0.6);
        let fire = self.rng.gen_bool(0.3);
        ctx.with_co_component_mut(|input: &mut InputComponent| {
            input.turn = turn;
            input.thrust = thrust;
            input.fire = fire;
        });
    }
}

/// Logs score changes
#[derive(Debug, Default)]
pub struct ScoreLog;

impl ValueObserver<u32> for ScoreLog {
    fn did_change(&mut self, old: &u32, new: &u32) {
        log::debug!("score {} -> {}", old, new);
    }
}

/// Game-wide score
pub type ScoreComponent = ValueComponent<u32, ScoreLog>;

/// Constant-velocity motion of the entity's node
#[derive(Debug, Clone, Copy)]
pub struct DriftComponent {
    /// Units per second
    pub velocity: Vec2,
}

impl DriftComponent {
    /// Drift with a velocity
    pub fn new(velocity: Vec2) -> Self {
        Self { velocity }
    }
}

impl Component for DriftComponent {
    fn required_component_types(&self) -> Vec<ComponentKey> {
        vec![ComponentKey::of::<NodeComponent>()]
    }

    fn update(&mut self, ctx: &ComponentContext<'_>, delta_time: f64) {
        let step = self.velocity * delta_time as f32;
        ctx.with_co_component(|node: &NodeComponent| node.set_position(node.position() + step));
    }
}

/// Steers the ship from the relayed input and fires bullets
#[derive(Debug)]
pub struct ShipControlComponent {
    heading: f32,
    velocity: Vec2,
    cooldown: f64,
    shots_fired: u32,
}

impl ShipControlComponent {
    const TURN_RATE: f32 = 3.0;
    const SPEED: f32 = 60.0;
    /// Fraction of the gap to the thrust velocity closed per second
    const RESPONSE: f32 = 4.0;
    const BULLET_SPEED: f32 = 240.0;
    const FIRE_INTERVAL: f64 = 0.25;

    /// Ship facing +x
    pub fn new() -> Self {
        Self {
            heading: 0.0,
            velocity: Vec2::zeros(),
            cooldown: 0.0,
            shots_fired: 0,
        }
    }

    /// Bullets fired so far
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    fn direction(&self) -> Vec2 {
        Vec2::new(self.heading.cos(), self.heading.sin())
    }

    fn fire(&mut self, ctx: &ComponentContext<'_>, from: Vec2) {
        let bullet = Entity::named("bullet");
        bullet.insert(NodeComponent::named("bullet", from));
        bullet.insert(DriftComponent::new(self.direction() * Self::BULLET_SPEED));
        bullet.insert(LifetimeComponent::new(0.8));

        if ctx.entity().spawn(&bullet) {
            self.shots_fired += 1;
            self.cooldown = Self::FIRE_INTERVAL;
            ctx.with_co_component_mut(|score: &mut ScoreComponent| score.modify(|s| s + 10));
        }
    }
}

impl Component for ShipControlComponent {
    fn required_component_types(&self) -> Vec<ComponentKey> {
        vec![ComponentKey::of::<NodeComponent>(), ComponentKey::of::<InputComponent>()]
    }

    fn update(&mut self, ctx: &ComponentContext<'_>, delta_time: f64) {
        let Some(input) = ctx.with_co_component(|input: &InputComponent| *input) else {
            return;
        };
        let dt = delta_time as f32;
        self.heading += input.turn * Self::TURN_RATE * dt;
        self.cooldown = (self.cooldown - delta_time).max(0.0);

        let target = if input.thrust {
            self.direction() * Self::SPEED
        } else {
            Vec2::zeros()
        };
        self.velocity = clamp_length(lerp(self.velocity, target, Self::RESPONSE * dt), Self::SPEED);

        let step = self.velocity * dt;
        let Some(position) = ctx.with_co_component(|node: &NodeComponent| {
            node.set_position(node.position() + step);
            node.position()
        }) else {
            return;
        };

        if input.fire && self.cooldown <= 0.0 {
            self.fire(ctx, position);
        }
    }
}

/// Random asteroid field
pub fn asteroid(rng: &mut impl Rng, index: usize) -> Entity {
    let position = Vec2::new(rng.gen_range(-200.0..200.0), rng.gen_range(-150.0..150.0));
    let velocity = Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-20.0..20.0));

    let entity = Entity::named(format!("asteroid {index}"));
    entity.insert(NodeComponent::named("asteroid", position));
    entity.insert(DriftComponent::new(velocity));
    entity
}
