//! Steering agents and goal components
//!
//! The host's behavior system is represented by [`Agent`], which only keeps
//! weighted named goals. Goal components are thin drivers around a
//! [`GoalStrategy`]: on attach they ask the strategy for a goal and hand it to
//! the sibling [`AgentComponent`]; on detach they take it back.

use std::any::type_name;
use std::cell::RefCell;
use std::rc::Rc;

use crate::ecs::{Component, ComponentContext, ComponentKey};

/// Shared agent reference
pub type AgentRef = Rc<RefCell<Agent>>;

/// Named steering goal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    /// Goal name, unique per agent
    pub name: String,
}

impl Goal {
    /// Create a named goal
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Behavior agent with weighted goals
#[derive(Debug, Clone, Default)]
pub struct Agent {
    /// Speed cap the host steering simulation should respect
    pub max_speed: f32,
    goals: Vec<(Goal, f32)>,
}

impl Agent {
    /// Create an agent with a speed cap
    pub fn new(max_speed: f32) -> Self {
        Self {
            max_speed,
            goals: Vec::new(),
        }
    }

    /// Set or replace a goal by name
    pub fn set_goal(&mut self, goal: Goal, weight: f32) {
        match self.goals.iter_mut().find(|(g, _)| g.name == goal.name) {
            Some(entry) => entry.1 = weight,
            None => self.goals.push((goal, weight)),
        }
    }

    /// Remove a goal by name
    pub fn remove_goal(&mut self, name: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|(g, _)| g.name != name);
        before != self.goals.len()
    }

    /// Weight of a goal, if present
    pub fn goal_weight(&self, name: &str) -> Option<f32> {
        self.goals.iter().find(|(g, _)| g.name == name).map(|(_, w)| *w)
    }

    /// All goals with their weights
    pub fn goals(&self) -> &[(Goal, f32)] {
        &self.goals
    }
}

/// Component exposing an [`Agent`]
#[derive(Debug, Clone)]
pub struct AgentComponent {
    agent: AgentRef,
}

impl AgentComponent {
    /// Create a component around a new agent
    pub fn new(max_speed: f32) -> Self {
        Self {
            agent: Rc::new(RefCell::new(Agent::new(max_speed))),
        }
    }

    /// Shared agent reference
    pub fn agent_ref(&self) -> &AgentRef {
        &self.agent
    }
}

impl Component for AgentComponent {
    fn agent(&self) -> Option<AgentRef> {
        Some(self.agent.clone())
    }
}

/// Produces the goal a [`GoalComponent`] installs
pub trait GoalStrategy: 'static {
    /// Build the goal; the default logs and returns `None`
    fn create_goal(&mut self, _ctx: &ComponentContext<'_>) -> Option<Goal> {
        log::warn!("{} does not override create_goal; no goal installed", type_name::<Self>());
        None
    }
}

/// Installs a strategy's goal on the sibling agent
pub struct GoalComponent<S: GoalStrategy> {
    strategy: S,
    weight: f32,
    installed: Option<Goal>,
    weight_dirty: bool,
}

impl<S: GoalStrategy> GoalComponent<S> {
    /// Create a goal component with a weight
    pub fn new(strategy: S, weight: f32) -> Self {
        Self {
            strategy,
            weight,
            installed: None,
            weight_dirty: false,
        }
    }

    /// Current weight
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Change the weight; applied to the agent on the next update
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
        self.weight_dirty = true;
    }

    /// Goal currently installed on the agent
    pub fn installed_goal(&self) -> Option<&Goal> {
        self.installed.as_ref()
    }

    /// The strategy
    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<S: GoalStrategy> Component for GoalComponent<S> {
    fn required_component_types(&self) -> Vec<ComponentKey> {
        vec![ComponentKey::of::<AgentComponent>()]
    }

    fn did_add_to_entity(&mut self, ctx: &ComponentContext<'_>) {
        let Some(agent) = ctx.co_component::<AgentComponent>().and_then(|h| h.agent()) else {
            return;
        };
        if let Some(goal) = self.strategy.create_goal(ctx) {
            agent.borrow_mut().set_goal(goal.clone(), self.weight);
            self.installed = Some(goal);
        }
    }

    fn will_remove_from_entity(&mut self, ctx: &ComponentContext<'_>) {
        let Some(goal) = self.installed.take() else {
            return;
        };
        if let Some(agent) = ctx.co_component::<AgentComponent>().and_then(|h| h.agent()) {
            agent.borrow_mut().remove_goal(&goal.name);
        }
    }

    fn update(&mut self, ctx: &ComponentContext<'_>, _delta_time: f64) {
        if !self.weight_dirty {
            return;
        }
        if let (Some(goal), Some(agent)) = (
            self.installed.as_ref(),
            ctx.co_component::<AgentComponent>().and_then(|h| h.agent()),
        ) {
            agent.borrow_mut().set_goal(goal.clone(), self.weight);
        }
        self.weight_dirty = false;
    }
}
