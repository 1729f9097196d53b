//! Node component
//!
//! Associates a [`Node`] with an entity. The scene attaches the node to its
//! root node while the entity is in the scene; when the component leaves its
//! entity the node is detached from the render tree.

use crate::ecs::{Component, ComponentContext};
use crate::foundation::math::Vec2;
use crate::scene::{node, Node, NodeRef};

/// Component exposing a drawable node
#[derive(Debug, Clone)]
pub struct NodeComponent {
    node: NodeRef,
}

impl NodeComponent {
    /// Wrap an existing node
    pub fn new(node: NodeRef) -> Self {
        Self { node }
    }

    /// Create a fresh named node at `position`
    pub fn named(name: impl Into<String>, position: Vec2) -> Self {
        let mut node = Node::new(name);
        node.position = position;
        Self::new(node.into_ref())
    }

    /// Shared node reference
    pub fn node_ref(&self) -> &NodeRef {
        &self.node
    }

    /// Current node position
    pub fn position(&self) -> Vec2 {
        self.node.borrow().position
    }

    /// Move the node
    pub fn set_position(&self, position: Vec2) {
        self.node.borrow_mut().position = position;
    }
}

impl Component for NodeComponent {
    fn will_remove_from_entity(&mut self, ctx: &ComponentContext<'_>) {
        log::trace!("detaching node of {}", ctx.entity());
        node::remove_from_parent(&self.node);
    }

    fn node(&self) -> Option<NodeRef> {
        Some(self.node.clone())
    }
}
