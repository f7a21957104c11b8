//! Component lifecycle binding
//!
//! [`ComponentConstructor`] is what the host registry runs when an element
//! of a defined tag is created or upgraded. It builds the shadow tree and
//! returns a [`ComponentInstance`], which receives the host's lifecycle
//! reactions for that element:
//!
//! - first connection applies defaults, runs the controller once and
//!   installs its properties;
//! - every connection attaches the controller's listeners and runs
//!   `connected_callback`;
//! - disconnection detaches those listeners and runs
//!   `disconnected_callback`.
//!
//! Components with a form input get it created and synced at first
//! connection, and resynced whenever a mirrored attribute changes.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use htna_dom::{
    CustomElementConstructor, CustomElementReactions, Dom, DomResult, ListenerId, ListenerOptions, NodeId,
};
use indexmap::IndexMap;

use crate::dom_access::append_template;
use crate::form_input::FormInput;
use crate::{
    AttributeValue, AttributesAccess, ComponentDefinition, ControllerArgs, ControllerResult, DomAccess,
    HtnaError, PropertyDescriptor, Result, SlotAccess, StyleAccess, Template, TypeRegistry,
};

/// Shadow content when a component has no render function
const DEFAULT_SHADOW: &str = "<slot></slot>";

/// Host constructor for one component definition
pub(crate) struct ComponentConstructor {
    definition: Rc<ComponentDefinition>,
    types: TypeRegistry,
}

impl ComponentConstructor {
    pub(crate) fn new(definition: Rc<ComponentDefinition>, types: TypeRegistry) -> Self {
        Self { definition, types }
    }

    fn build(&self, dom: &Dom, element: NodeId) -> Result<ComponentInstance> {
        let definition = &self.definition;
        let shadow = dom.attach_shadow(element, definition.mode)?;
        let scoped = Rc::clone(&definition.scoped_style_class);

        let attributes = AttributesAccess::new(dom.clone(), element, Rc::clone(&definition.types), self.types.clone());
        let args = ControllerArgs {
            element,
            dom: dom.clone(),
            light: DomAccess::new(dom.clone(), element, Rc::clone(&scoped)),
            shadow: DomAccess::new(dom.clone(), shadow, Rc::clone(&scoped)),
            attributes: attributes.clone(),
            slot: SlotAccess::new(dom.clone(), element, Rc::clone(&definition.slot_wrapper)),
            style: StyleAccess::new(dom.clone(), shadow, scoped),
        };

        let properties: IndexMap<String, PropertyDescriptor> = definition
            .properties
            .iter()
            .map(|(attribute, property)| (property.clone(), PropertyDescriptor::attribute(&attributes, attribute)))
            .collect();

        let content = match &definition.render {
            Some(render) => render(&args),
            None => Template::from(DEFAULT_SHADOW),
        };
        append_template(dom, shadow, content)?;
        if let Some(css) = &definition.style {
            args.style.add_style(css)?;
        }

        let form_input = definition.form_input.map(|kind| FormInput::new(kind, dom.clone(), element));

        Ok(ComponentInstance {
            definition: Rc::clone(definition),
            shadow,
            form_input,
            args,
            properties: RefCell::new(properties),
            state: RefCell::new(InstanceState::default()),
        })
    }
}

impl CustomElementConstructor for ComponentConstructor {
    fn construct(&self, dom: &Dom, element: NodeId) -> DomResult<Rc<dyn CustomElementReactions>> {
        let instance = self.build(dom, element)?;
        tracing::trace!("Constructed component on {:?} (shadow {:?})", element, instance.shadow);
        Ok(Rc::new(instance))
    }
}

#[derive(Default)]
struct InstanceState {
    initialized: bool,
    result: ControllerResult,
    /// Listeners attached at the last connection
    attached: Vec<ListenerId>,
}

/// Per-element state of a component
pub(crate) struct ComponentInstance {
    definition: Rc<ComponentDefinition>,
    shadow: NodeId,
    form_input: Option<FormInput>,
    args: ControllerArgs,
    properties: RefCell<IndexMap<String, PropertyDescriptor>>,
    state: RefCell<InstanceState>,
}

impl ComponentInstance {
    /// One-time setup on first connection
    fn initialize(&self) {
        let attributes = &self.args.attributes;
        for (name, value) in &self.definition.defaults {
            if attributes.has(name) {
                continue;
            }
            if let Err(err) = attributes.set(name, value.clone()) {
                tracing::warn!("Default for attribute '{}' on {:?} not applied: {}", name, self.args.element, err);
            }
        }
        self.sync_form_input();

        let result = self
            .definition
            .controller
            .as_ref()
            .and_then(|controller| controller(&self.args))
            .unwrap_or_default();
        self.properties
            .borrow_mut()
            .extend(result.properties.iter().map(|(name, desc)| (name.clone(), desc.clone())));
        self.state.borrow_mut().result = result;
    }

    fn sync_form_input(&self) {
        if let Some(Err(err)) = self.form_input.as_ref().map(FormInput::sync) {
            tracing::warn!("Form input of {:?} not synced: {}", self.args.element, err);
        }
    }
}

impl CustomElementReactions for ComponentInstance {
    fn connected(&self, dom: &Dom, element: NodeId) {
        let first = !std::mem::replace(&mut self.state.borrow_mut().initialized, true);
        if first {
            tracing::debug!("Initializing component on {:?}", element);
            self.initialize();
        } else {
            tracing::trace!("Component on {:?} reconnected", element);
        }

        let (listeners, callback) = {
            let state = self.state.borrow();
            (state.result.listeners.clone(), state.result.connected_callback.clone())
        };
        let attached: Vec<ListenerId> = listeners
            .into_iter()
            .map(|(event_type, listener)| {
                dom.add_event_listener_with(element, &event_type, listener, ListenerOptions::default())
            })
            .collect();
        self.state.borrow_mut().attached.extend(attached);

        if let Some(callback) = callback {
            callback();
        }
    }

    fn disconnected(&self, dom: &Dom, element: NodeId) {
        let (attached, callback) = {
            let mut state = self.state.borrow_mut();
            (std::mem::take(&mut state.attached), state.result.disconnected_callback.clone())
        };
        tracing::trace!("Component on {:?} disconnected, detaching {} listeners", element, attached.len());
        for id in attached {
            dom.remove_event_listener(element, id);
        }
        if let Some(callback) = callback {
            callback();
        }
    }

    fn adopted(&self, _dom: &Dom, element: NodeId) {
        tracing::trace!("Component on {:?} adopted", element);
        let callback = self.state.borrow().result.adopted_callback.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn attribute_changed(
        &self,
        _dom: &Dom,
        _element: NodeId,
        name: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) {
        let initialized = self.state.borrow().initialized;
        if initialized && self.form_input.as_ref().is_some_and(|input| input.tracks(name)) {
            self.sync_form_input();
        }

        let handler = self
            .state
            .borrow()
            .result
            .attribute_changed_callback
            .as_ref()
            .and_then(|routing| routing.handler_for(name));
        if let Some(handler) = handler {
            handler(name, old_value, new_value);
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ComponentInstance")
            .field("element", &self.args.element)
            .field("shadow", &self.shadow)
            .field("initialized", &state.initialized)
            .field("attached", &state.attached.len())
            .finish()
    }
}

/// Handle to an element upgraded by a component definition
#[derive(Clone)]
pub struct DefinedElement {
    dom: Dom,
    node: NodeId,
    instance: Rc<ComponentInstance>,
}

impl DefinedElement {
    /// View `node` as a component element, if a component upgraded it
    pub(crate) fn from_node(dom: &Dom, node: NodeId) -> Option<Self> {
        let instance = dom.reactions(node)?.into_any().downcast::<ComponentInstance>().ok()?;
        Some(Self { dom: dom.clone(), node, instance })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Shadow root, whatever its mode
    pub fn shadow_root(&self) -> NodeId {
        self.instance.shadow
    }

    pub fn attributes(&self) -> &AttributesAccess {
        &self.instance.args.attributes
    }

    pub fn light(&self) -> &DomAccess {
        &self.instance.args.light
    }

    pub fn shadow(&self) -> &DomAccess {
        &self.instance.args.shadow
    }

    pub fn slot(&self) -> &SlotAccess {
        &self.instance.args.slot
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.instance.definition
    }

    /// Whether the first connection already ran the controller
    pub fn is_initialized(&self) -> bool {
        self.instance.state.borrow().initialized
    }

    /// Names of installed properties
    pub fn property_names(&self) -> Vec<String> {
        self.instance.properties.borrow().keys().cloned().collect()
    }

    /// Read an instance property
    pub fn property(&self, name: &str) -> Result<AttributeValue> {
        let descriptor = self.descriptor(name)?;
        Ok((descriptor.get)())
    }

    /// Write an instance property
    pub fn set_property(&self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        let setter = descriptor.set.ok_or_else(|| HtnaError::ReadOnlyProperty(name.to_string()))?;
        setter(value.into())
    }

    fn descriptor(&self, name: &str) -> Result<PropertyDescriptor> {
        self.instance
            .properties
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| HtnaError::UnknownProperty(name.to_string()))
    }
}

impl fmt::Debug for DefinedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinedElement")
            .field("node", &self.node)
            .field("instance", &self.instance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentConfig, Options, RichDataStore};
    use htna_dom::{CustomElementOptions, ShadowRootMode};

    fn define(dom: &Dom, tag: &str, config: ComponentConfig) -> Rc<ComponentDefinition> {
        let definition = Rc::new(ComponentDefinition::compile(&config, &Options::default()));
        let constructor = ComponentConstructor::new(Rc::clone(&definition), TypeRegistry::new(RichDataStore::new()));
        let options = CustomElementOptions {
            extends: None,
            observed_attributes: definition.observed_attributes().to_vec(),
        };
        dom.define(tag, Rc::new(constructor), options).unwrap();
        definition
    }

    #[test]
    fn test_default_shadow_is_a_slot() {
        let dom = Dom::new();
        define(&dom, "x-plain", ComponentConfig::new().mode(ShadowRootMode::Open));
        let node = dom.create_element("x-plain").unwrap();
        let shadow = dom.shadow_root(node).unwrap();
        assert_eq!(htna_html::inner_html(&dom.tree(), shadow), "<slot></slot>");
    }

    #[test]
    fn test_closed_shadow_reachable_from_handle() {
        let dom = Dom::new();
        define(&dom, "x-closed", ComponentConfig::new().render(|_| "<i>x</i>").style("i{}"));
        let node = dom.create_element("x-closed").unwrap();
        assert_eq!(dom.shadow_root(node), None);

        let element = DefinedElement::from_node(&dom, node).unwrap();
        assert_eq!(
            htna_html::inner_html(&dom.tree(), element.shadow_root()),
            "<i>x</i><style class=\"htna-scoped-style\" type=\"text/css\">i{}</style>"
        );
    }

    #[test]
    fn test_plain_element_is_not_defined() {
        let dom = Dom::new();
        let node = dom.create_element("div").unwrap();
        assert!(DefinedElement::from_node(&dom, node).is_none());
    }

    #[test]
    fn test_read_only_and_unknown_properties() {
        let dom = Dom::new();
        let config = ComponentConfig::new().controller(|_: &ControllerArgs| {
            ControllerResult::new().property("answer", PropertyDescriptor::read_only(|| 42.into()))
        });
        define(&dom, "x-props", config);
        let node = dom.create_element("x-props").unwrap();
        dom.append_child(dom.body(), node).unwrap();

        let element = DefinedElement::from_node(&dom, node).unwrap();
        assert_eq!(element.property("answer").unwrap(), AttributeValue::Number(42.0));
        assert!(matches!(element.set_property("answer", 1), Err(HtnaError::ReadOnlyProperty(_))));
        assert!(matches!(element.property("missing"), Err(HtnaError::UnknownProperty(_))));
    }
}
