//! Observable value component
//!
//! Holds a value and reports changes to a [`ValueObserver`] strategy, which
//! replaces subclass-per-value hierarchies with one small trait.

use crate::ecs::{Component, ComponentContext};

/// Reacts to value changes
pub trait ValueObserver<V>: 'static {
    /// Called after the value changed from `old` to `new`
    fn did_change(&mut self, old: &V, new: &V);
}

/// Observer that ignores every change
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObserver;

impl<V> ValueObserver<V> for NoObserver {
    fn did_change(&mut self, _old: &V, _new: &V) {}
}

/// A value with change notification
#[derive(Debug, Clone)]
pub struct ValueComponent<V, O = NoObserver> {
    value: V,
    observer: O,
}

impl<V: PartialEq + Clone + 'static, O: ValueObserver<V>> ValueComponent<V, O> {
    /// Create with an initial value and observer
    pub fn with_observer(value: V, observer: O) -> Self {
        Self { value, observer }
    }

    /// Current value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Replace the value, notifying the observer only if it differs
    pub fn set(&mut self, value: V) -> bool {
        if value == self.value {
            return false;
        }
        let old = std::mem::replace(&mut self.value, value);
        self.observer.did_change(&old, &self.value);
        true
    }

    /// Apply a function to the value
    pub fn modify(&mut self, f: impl FnOnce(&V) -> V) -> bool {
        let next = f(&self.value);
        self.set(next)
    }

    /// The observer
    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<V: PartialEq + Clone + 'static> ValueComponent<V, NoObserver> {
    /// Create without an observer
    pub fn new(value: V) -> Self {
        Self::with_observer(value, NoObserver)
    }
}

impl<V: PartialEq + Clone + 'static, O: ValueObserver<V>> Component for ValueComponent<V, O> {
    fn did_add_to_entity(&mut self, ctx: &ComponentContext<'_>) {
        log::trace!("{} attached to {}", ctx.own_key(), ctx.entity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct ChangeLog(Vec<(u32, u32)>);
    impl ValueObserver<u32> for ChangeLog {
        fn did_change(&mut self, old: &u32, new: &u32) {
            self.0.push((*old, *new));
        }
    }

    #[test]
    fn test_observer_sees_real_changes_only() {
        let mut score = ValueComponent::with_observer(0_u32, ChangeLog::default());

        assert!(score.set(10));
        assert!(!score.set(10));
        assert!(score.modify(|v| v + 5));

        assert_eq!(*score.value(), 15);
        assert_eq!(score.observer().0, vec![(0, 10), (10, 15)]);
    }

    #[test]
    fn test_plain_value() {
        let mut lives = ValueComponent::new(3_i32);
        lives.modify(|v| v - 1);
        assert_eq!(*lives.value(), 2);
    }
}
