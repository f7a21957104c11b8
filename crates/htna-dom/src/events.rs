//! DOM Events
//!
//! Event objects and per-node listener storage. Dispatch (path building,
//! shadow boundary crossing) lives in `Dom::dispatch_event`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::NodeId;

/// Arbitrary payload carried by an event
pub type EventDetail = Rc<dyn Any>;

/// Event listener callback
pub type Listener = Rc<dyn Fn(&mut Event)>;

/// Handle returned by `add_event_listener`, used for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registration options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Remove the listener after its first invocation
    pub once: bool,
}

/// DOM event
#[derive(Clone)]
pub struct Event {
    pub event_type: String,
    pub detail: Option<EventDetail>,
    pub bubbles: bool,
    pub cancelable: bool,
    /// Crosses shadow root boundaries
    pub composed: bool,
    pub target: NodeId,
    pub current_target: NodeId,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    /// Create a plain, non-bubbling event
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            detail: None,
            bubbles: false,
            cancelable: false,
            composed: false,
            target: NodeId::NONE,
            current_target: NodeId::NONE,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create a composed, cancelable custom event
    pub fn custom(event_type: &str, detail: Option<EventDetail>, bubbles: bool) -> Self {
        Self {
            detail,
            bubbles,
            cancelable: true,
            composed: true,
            ..Self::new(event_type)
        }
    }

    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    pub fn with_composed(mut self, composed: bool) -> Self {
        self.composed = composed;
        self
    }

    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    /// Typed view of the detail payload
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_ref()?.downcast_ref::<T>()
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation to further nodes of the path
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("has_detail", &self.detail.is_some())
            .field("bubbles", &self.bubbles)
            .field("cancelable", &self.cancelable)
            .field("composed", &self.composed)
            .field("target", &self.target)
            .field("current_target", &self.current_target)
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}

struct RegisteredListener {
    id: ListenerId,
    event_type: String,
    callback: Listener,
    once: bool,
}

/// Event listener storage, keyed by node
#[derive(Default)]
pub(crate) struct EventListenerRegistry {
    listeners: HashMap<NodeId, Vec<RegisteredListener>>,
    next_id: u64,
}

impl EventListenerRegistry {
    /// Add an event listener
    pub fn add(&mut self, node: NodeId, event_type: &str, callback: Listener, options: ListenerOptions) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        self.listeners.entry(node).or_default().push(RegisteredListener {
            id,
            event_type: event_type.to_string(),
            callback,
            once: options.once,
        });
        id
    }

    /// Remove an event listener
    pub fn remove(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&node) else {
            return false;
        };
        let Some(pos) = list.iter().position(|l| l.id == id) else {
            return false;
        };
        list.remove(pos);
        if list.is_empty() {
            self.listeners.remove(&node);
        }
        true
    }

    /// Check whether a listener is still registered
    pub fn contains(&self, node: NodeId, id: ListenerId) -> bool {
        self.listeners
            .get(&node)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    /// Snapshot of the listeners for a node and event type, in registration order
    pub fn matching(&self, node: NodeId, event_type: &str) -> Vec<(ListenerId, Listener, bool)> {
        self.listeners
            .get(&node)
            .map(|list| {
                list.iter()
                    .filter(|l| l.event_type == event_type)
                    .map(|l| (l.id, Rc::clone(&l.callback), l.once))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of listeners for a node and event type
    pub fn count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&node)
            .map(|list| list.iter().filter(|l| l.event_type == event_type).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_custom_event_flags() {
        let event = Event::custom("tick", None, false);
        assert!(event.composed);
        assert!(event.cancelable);
        assert!(!event.bubbles);

        let mut plain = Event::new("click");
        plain.prevent_default();
        assert!(!plain.is_default_prevented(), "non-cancelable events ignore prevent_default");
    }

    #[test]
    fn test_detail_downcast() {
        let event = Event::new("data").with_detail(42u32);
        assert_eq!(event.detail::<u32>(), Some(&42));
        assert_eq!(event.detail::<String>(), None);
    }

    #[test]
    fn test_registry_add_remove() {
        let mut registry = EventListenerRegistry::default();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let callback: Listener = Rc::new(move |_: &mut Event| counter.set(counter.get() + 1));

        let a = registry.add(NodeId(1), "click", Rc::clone(&callback), ListenerOptions::default());
        let b = registry.add(NodeId(1), "click", callback, ListenerOptions { once: true });
        assert_ne!(a, b);
        assert_eq!(registry.count(NodeId(1), "click"), 2);

        for (_, listener, _) in registry.matching(NodeId(1), "click") {
            listener(&mut Event::new("click"));
        }
        assert_eq!(hits.get(), 2);

        assert!(registry.remove(NodeId(1), a));
        assert!(!registry.remove(NodeId(1), a));
        assert!(registry.contains(NodeId(1), b));
        assert_eq!(registry.count(NodeId(1), "click"), 1);
    }
}
