//! Owned callback registries with explicit unsubscribe handles.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(T)>;

struct Slots<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Callback<T>)>>,
}

trait Unregister {
    fn remove(&self, id: u64);
}

impl<T> Unregister for Slots<T> {
    fn remove(&self, id: u64) {
        self.entries.borrow_mut().retain(|(slot, _)| *slot != id);
    }
}

/// Set of callbacks for one event kind. Every callback receives its own clone
/// of the notified value.
pub struct Subscribers<T> {
    slots: Rc<Slots<T>>,
}

impl<T: Clone + 'static> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(Slots {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn add(&self, callback: impl Fn(T) + 'static) -> Subscription {
        let id = self.slots.next_id.get();
        self.slots.next_id.set(id + 1);
        self.slots
            .entries
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let registry: Rc<dyn Unregister> = self.slots.clone();
        Subscription {
            registry: Rc::downgrade(&registry),
            id,
        }
    }

    /// Invoke every callback registered at the time of the call. Callbacks may
    /// subscribe or unsubscribe while being notified.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .slots
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in snapshot {
            callback(value.clone());
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.entries.borrow().len()
    }
}

impl<T: Clone + 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by `on_*` registrations. Dropping it keeps the callback
/// registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    registry: Weak<dyn Unregister>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_every_subscriber_until_unsubscribed() {
        let subscribers = Subscribers::<String>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let seen = seen.clone();
            subscribers.add(move |msg| seen.borrow_mut().push(format!("a:{msg}")))
        };
        let _second = {
            let seen = seen.clone();
            subscribers.add(move |msg| seen.borrow_mut().push(format!("b:{msg}")))
        };

        subscribers.notify(&"one".to_string());
        first.unsubscribe();
        subscribers.notify(&"two".to_string());

        assert_eq!(*seen.borrow(), vec!["a:one", "b:one", "b:two"]);
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn callbacks_may_subscribe_during_notify() {
        let subscribers = Rc::new(Subscribers::<u32>::new());
        let nested = subscribers.clone();
        let _outer = subscribers.add(move |_| {
            let _ = nested.add(|_| {});
        });

        subscribers.notify(&1);
        assert_eq!(subscribers.len(), 2);
    }

    #[test]
    fn unsubscribe_after_registry_dropped_is_a_no_op() {
        let subscribers = Subscribers::<u32>::new();
        let handle = subscribers.add(|_| {});
        drop(subscribers);
        handle.unsubscribe();
    }
}
