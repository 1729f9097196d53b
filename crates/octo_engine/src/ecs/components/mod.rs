//! ECS Components module
//!
//! Built-in components covering the runtime's external contracts (nodes and
//! agents) plus a few general-purpose building blocks.

pub mod node;
pub mod agent;
pub mod time;
pub mod lifetime;
pub mod value;

pub use node::NodeComponent;
pub use agent::{Agent, AgentComponent, AgentRef, Goal, GoalComponent, GoalStrategy};
pub use time::TimeComponent;
pub use lifetime::LifetimeComponent;
pub use value::{NoObserver, ValueComponent, ValueObserver};
