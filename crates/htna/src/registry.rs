//! Definition registry
//!
//! Maps tag names to compiled definitions and registers them with the
//! host's custom element registry. The first definition of a tag wins.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use htna_dom::{CustomElementError, CustomElementOptions, CustomElementRegistry, Dom, DomError, NodeId};
use indexmap::IndexMap;

use crate::element::ComponentConstructor;
use crate::{ComponentDefinition, HtnaError, Result, TypeRegistry};

/// Tag → definition map bound to one host `Dom`
#[derive(Clone)]
pub struct DefinitionRegistry {
    dom: Dom,
    definitions: Rc<RefCell<IndexMap<String, Rc<ComponentDefinition>>>>,
}

impl DefinitionRegistry {
    pub fn new(dom: Dom) -> Self {
        Self { dom, definitions: Rc::default() }
    }

    /// Register `definition` under `tag`
    ///
    /// Existing elements with that tag are upgraded by the host.
    pub fn add(&self, tag: &str, definition: Rc<ComponentDefinition>, types: &TypeRegistry) -> Result<()> {
        if !CustomElementRegistry::is_valid_name(tag) {
            return Err(HtnaError::InvalidName(tag.to_string()));
        }
        if self.exists(tag) || self.dom.is_defined(tag) {
            return Err(HtnaError::DuplicateDefinition(tag.to_string()));
        }

        let options = CustomElementOptions {
            extends: definition.extends.clone(),
            observed_attributes: definition.observed.clone(),
        };
        // Stored first so elements upgraded by `define` can already be looked up
        self.definitions.borrow_mut().insert(tag.to_string(), Rc::clone(&definition));

        let constructor = ComponentConstructor::new(definition, types.clone());
        if let Err(err) = self.dom.define(tag, Rc::new(constructor), options) {
            return Err(self.rollback(tag, err));
        }
        tracing::debug!("Registered component <{}>", tag);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<Rc<ComponentDefinition>> {
        self.definitions.borrow().get(tag).cloned()
    }

    pub fn exists(&self, tag: &str) -> bool {
        self.definitions.borrow().contains_key(tag)
    }

    /// Registered tags, in registration order
    pub fn tags(&self) -> Vec<String> {
        self.definitions.borrow().keys().cloned().collect()
    }

    /// Ask the host to upgrade an element created before its tag was defined
    pub fn upgrade(&self, node: NodeId) -> Result<bool> {
        Ok(self.dom.upgrade(node)?)
    }

    fn rollback(&self, tag: &str, err: DomError) -> HtnaError {
        match err {
            // Rejected by the host registry: nothing was defined there
            DomError::CustomElement(CustomElementError::AlreadyDefined(_)) => {
                self.definitions.borrow_mut().shift_remove(tag);
                HtnaError::DuplicateDefinition(tag.to_string())
            }
            DomError::CustomElement(CustomElementError::InvalidName(_)) => {
                self.definitions.borrow_mut().shift_remove(tag);
                HtnaError::InvalidName(tag.to_string())
            }
            DomError::CustomElement(err @ CustomElementError::InvalidExtends(_)) => {
                self.definitions.borrow_mut().shift_remove(tag);
                HtnaError::Dom(DomError::CustomElement(err))
            }
            // Defined, but upgrading an existing element failed
            other => HtnaError::Dom(other),
        }
    }
}

impl fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionRegistry").field("tags", &self.tags()).finish()
    }
}
