//! Retained-mode node tree
//!
//! A minimal stand-in for the host's 2D scene graph: nodes have a name, a
//! position, a z-position, a visibility flag and children. The scene keeps a
//! root node and attaches the node of every entity it holds beneath it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::foundation::math::Vec2;

/// Shared node reference
pub type NodeRef = Rc<RefCell<Node>>;

/// Drawable/positionable object
#[derive(Debug, Default)]
pub struct Node {
    /// Debug name
    pub name: Option<String>,
    /// Position relative to the parent
    pub position: Vec2,
    /// Draw order relative to siblings
    pub z_position: f32,
    /// Whether the node is hidden
    pub hidden: bool,
    children: Vec<NodeRef>,
    parent: Weak<RefCell<Node>>,
}

impl Node {
    /// Create a named node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Wrap in a shared reference
    pub fn into_ref(self) -> NodeRef {
        Rc::new(RefCell::new(self))
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Parent node, if attached
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    /// Whether the node is attached to a parent
    pub fn has_parent(&self) -> bool {
        self.parent.strong_count() > 0
    }
}

/// Attach `child` under `parent`, detaching it from any previous parent
pub fn add_child(parent: &NodeRef, child: &NodeRef) {
    if Rc::ptr_eq(parent, child) {
        log::warn!("refusing to attach a node to itself");
        return;
    }
    remove_from_parent(child);
    child.borrow_mut().parent = Rc::downgrade(parent);
    parent.borrow_mut().children.push(Rc::clone(child));
}

/// Detach `node` from its parent; no-op when unattached
pub fn remove_from_parent(node: &NodeRef) {
    let parent = node.borrow().parent();
    if let Some(parent) = parent {
        parent.borrow_mut().children.retain(|c| !Rc::ptr_eq(c, node));
    }
    node.borrow_mut().parent = Weak::new();
}

/// Whether `node` is a direct child of `parent`
pub fn is_child_of(node: &NodeRef, parent: &NodeRef) -> bool {
    node.borrow().parent().is_some_and(|p| Rc::ptr_eq(&p, parent))
}
