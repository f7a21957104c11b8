//! Controller arguments and results
//!
//! `render` and `controller` both receive [`ControllerArgs`]. The controller
//! answers with a [`ControllerResult`] whose callbacks and listeners are
//! bound to the element lifecycle.

use std::fmt;
use std::rc::Rc;

use htna_dom::{Dom, Event, Listener, NodeId};
use indexmap::IndexMap;

use crate::{AttributeValue, AttributesAccess, DomAccess, Result, SlotAccess, StyleAccess};

/// Lifecycle callback
pub type Callback = Rc<dyn Fn()>;

/// Attribute change callback: `(name, old, new)` raw values
pub type AttributeChangedFn = Rc<dyn Fn(&str, Option<&str>, Option<&str>)>;

/// Everything a component sees of its own instance
#[derive(Clone)]
pub struct ControllerArgs {
    /// The host element
    pub element: NodeId,
    pub dom: Dom,
    /// Light tree of the element
    pub light: DomAccess,
    /// Shadow tree of the element
    pub shadow: DomAccess,
    pub attributes: AttributesAccess,
    pub slot: SlotAccess,
    /// Styles of the shadow tree
    pub style: StyleAccess,
}

impl fmt::Debug for ControllerArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerArgs")
            .field("element", &self.element)
            .field("shadow", &self.shadow.node())
            .finish_non_exhaustive()
    }
}

/// Attribute-changed routing
#[derive(Clone)]
pub enum AttributeChangedHandler {
    /// One handler for every observed attribute
    Generic(AttributeChangedFn),
    /// Handlers keyed by attribute name; other names are ignored
    PerName(IndexMap<String, AttributeChangedFn>),
}

impl AttributeChangedHandler {
    pub(crate) fn handler_for(&self, name: &str) -> Option<AttributeChangedFn> {
        match self {
            Self::Generic(handler) => Some(Rc::clone(handler)),
            Self::PerName(handlers) => handlers.get(name).cloned(),
        }
    }
}

/// Instance property with a getter and an optional setter
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub get: Rc<dyn Fn() -> AttributeValue>,
    pub set: Option<Rc<dyn Fn(AttributeValue) -> Result<()>>>,
}

impl PropertyDescriptor {
    pub fn read_only<G>(get: G) -> Self
    where
        G: Fn() -> AttributeValue + 'static,
    {
        Self { get: Rc::new(get), set: None }
    }

    pub fn read_write<G, S>(get: G, set: S) -> Self
    where
        G: Fn() -> AttributeValue + 'static,
        S: Fn(AttributeValue) -> Result<()> + 'static,
    {
        Self { get: Rc::new(get), set: Some(Rc::new(set)) }
    }

    /// Property backed by an attribute through its accessor
    pub(crate) fn attribute(attributes: &AttributesAccess, name: &str) -> Self {
        let (reader, writer) = (attributes.clone(), attributes.clone());
        let (read_name, write_name) = (name.to_string(), name.to_string());
        Self::read_write(
            move || reader.get(&read_name),
            move |value| writer.set(&write_name, value),
        )
    }
}

/// What a controller hands back
#[derive(Clone, Default)]
pub struct ControllerResult {
    pub connected_callback: Option<Callback>,
    pub disconnected_callback: Option<Callback>,
    pub adopted_callback: Option<Callback>,
    pub attribute_changed_callback: Option<AttributeChangedHandler>,
    /// Event type → listener, attached to the element while connected
    pub listeners: IndexMap<String, Listener>,
    /// Extra instance properties
    pub properties: IndexMap<String, PropertyDescriptor>,
}

impl ControllerResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connected(mut self, f: impl Fn() + 'static) -> Self {
        self.connected_callback = Some(Rc::new(f));
        self
    }

    pub fn on_disconnected(mut self, f: impl Fn() + 'static) -> Self {
        self.disconnected_callback = Some(Rc::new(f));
        self
    }

    pub fn on_adopted(mut self, f: impl Fn() + 'static) -> Self {
        self.adopted_callback = Some(Rc::new(f));
        self
    }

    /// Handle every observed attribute change
    pub fn on_attribute_changed(mut self, f: impl Fn(&str, Option<&str>, Option<&str>) + 'static) -> Self {
        self.attribute_changed_callback = Some(AttributeChangedHandler::Generic(Rc::new(f)));
        self
    }

    /// Handle changes of one attribute; replaces a generic handler
    pub fn on_attribute(
        mut self,
        name: &str,
        f: impl Fn(&str, Option<&str>, Option<&str>) + 'static,
    ) -> Self {
        let mut handlers = match self.attribute_changed_callback.take() {
            Some(AttributeChangedHandler::PerName(handlers)) => handlers,
            _ => IndexMap::new(),
        };
        handlers.insert(name.to_string(), Rc::new(f));
        self.attribute_changed_callback = Some(AttributeChangedHandler::PerName(handlers));
        self
    }

    pub fn listener(mut self, event_type: &str, f: impl Fn(&mut Event) + 'static) -> Self {
        self.listeners.insert(event_type.to_string(), Rc::new(f));
        self
    }

    pub fn property(mut self, name: &str, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(name.to_string(), descriptor);
        self
    }
}

impl fmt::Debug for ControllerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerResult")
            .field("connected_callback", &self.connected_callback.is_some())
            .field("disconnected_callback", &self.disconnected_callback.is_some())
            .field("adopted_callback", &self.adopted_callback.is_some())
            .field("attribute_changed_callback", &self.attribute_changed_callback.is_some())
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_per_name_routing() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let result = ControllerResult::new()
            .on_attribute("size", move |name, _, new| sink.borrow_mut().push(format!("{name}={new:?}")));

        let handler = result.attribute_changed_callback.unwrap();
        handler.handler_for("size").unwrap()("size", None, Some("2"));
        assert!(handler.handler_for("color").is_none());
        assert_eq!(*seen.borrow(), ["size=Some(\"2\")"]);
    }

    #[test]
    fn test_generic_handler_matches_everything() {
        let handler = AttributeChangedHandler::Generic(Rc::new(|_: &str, _: Option<&str>, _: Option<&str>| {}));
        assert!(handler.handler_for("anything").is_some());
    }
}
