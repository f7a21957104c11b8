//! Root context
//!
//! [`Htna`] owns the per-context registries (types, rich data,
//! definitions) bound to one host [`Dom`]. Nothing here is global, so
//! several contexts may share a `Dom` without sharing state beyond the
//! host's own custom element registry.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use htna_dom::{Dom, NodeId};

use crate::{
    ComponentConfig, ComponentDefinition, DefinedElement, DefinitionRegistry, HtnaError, Options, Result,
    RichDataStore, TypeRegistry,
};

struct HtnaInner {
    dom: Dom,
    options: Options,
    types: TypeRegistry,
    definitions: DefinitionRegistry,
}

/// Component context bound to a host `Dom`
#[derive(Clone)]
pub struct Htna {
    inner: Rc<HtnaInner>,
}

impl Htna {
    pub fn new(dom: Dom, options: Options) -> Self {
        let types = TypeRegistry::new(RichDataStore::with_prefix(&options.rich_token_prefix));
        let definitions = DefinitionRegistry::new(dom.clone());
        tracing::debug!("HTNA context created (default mode: {})", options.default_mode.as_str());
        Self { inner: Rc::new(HtnaInner { dom, options, types, definitions }) }
    }

    pub fn dom(&self) -> &Dom {
        &self.inner.dom
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.inner.types
    }

    pub fn rich_data(&self) -> &RichDataStore {
        self.inner.types.rich_data()
    }

    pub fn definitions(&self) -> &DefinitionRegistry {
        &self.inner.definitions
    }

    /// Compile `config` and register it under `tag`
    pub fn define(&self, tag: &str, config: ComponentConfig) -> Result<ComponentHandle> {
        let handle = self.create(config);
        handle.register(tag)?;
        Ok(handle)
    }

    /// Compile `config` without registering it
    pub fn create(&self, config: ComponentConfig) -> ComponentHandle {
        let definition = Rc::new(ComponentDefinition::compile(&config, &self.inner.options));
        ComponentHandle { htna: self.clone(), definition, tags: RefCell::new(Vec::new()) }
    }

    /// Create a detached element of a registered tag
    pub fn instantiate(&self, tag: &str) -> Result<DefinedElement> {
        let definition = self
            .inner
            .definitions
            .get(tag)
            .ok_or_else(|| HtnaError::MissingDefinition(tag.to_string()))?;
        let dom = &self.inner.dom;
        let node = match definition.extends() {
            Some(base) => dom.create_element_with_is(base, tag)?,
            None => dom.create_element(tag)?,
        };
        DefinedElement::from_node(dom, node).ok_or_else(|| HtnaError::MissingDefinition(tag.to_string()))
    }

    /// Component view of an upgraded node
    pub fn element(&self, node: NodeId) -> Option<DefinedElement> {
        DefinedElement::from_node(&self.inner.dom, node)
    }
}

impl fmt::Debug for Htna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Htna")
            .field("options", &self.inner.options)
            .field("definitions", &self.inner.definitions)
            .finish_non_exhaustive()
    }
}

/// A compiled component, registrable under one or more tags
pub struct ComponentHandle {
    htna: Htna,
    definition: Rc<ComponentDefinition>,
    tags: RefCell<Vec<String>>,
}

impl ComponentHandle {
    /// Register the component under `tag`
    pub fn register(&self, tag: &str) -> Result<()> {
        let htna = &self.htna;
        htna.inner.definitions.add(tag, Rc::clone(&self.definition), &htna.inner.types)?;
        self.tags.borrow_mut().push(tag.to_string());
        Ok(())
    }

    /// Tags this handle registered
    pub fn tags(&self) -> Vec<String> {
        self.tags.borrow().clone()
    }

    /// Create an element of the first registered tag
    pub fn instantiate(&self) -> Result<DefinedElement> {
        let tag = self.tags.borrow().first().cloned();
        match tag {
            Some(tag) => self.htna.instantiate(&tag),
            None => Err(HtnaError::MissingDefinition("<unregistered component>".to_string())),
        }
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("tags", &self.tags.borrow())
            .field("definition", &self.definition)
            .finish()
    }
}
