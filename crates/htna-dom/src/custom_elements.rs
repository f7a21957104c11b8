//! Custom element definitions
//!
//! The registry maps names to definitions; each definition carries the
//! constructor that builds per-element [`CustomElementReactions`] when an
//! element is upgraded. Autonomous elements match by tag, customized
//! built-ins by their `is` value plus the extended tag.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{CustomElementError, Dom, DomResult, NodeId};

/// Lifecycle callbacks of an upgraded element
///
/// Every callback runs with no DOM borrow held, so implementations may call
/// back into `dom` freely.
pub trait CustomElementReactions {
    /// Element became connected to a document
    fn connected(&self, _dom: &Dom, _element: NodeId) {}

    /// Element was removed from a document
    fn disconnected(&self, _dom: &Dom, _element: NodeId) {}

    /// Element moved to another document
    fn adopted(&self, _dom: &Dom, _element: NodeId) {}

    /// An observed attribute changed
    fn attribute_changed(
        &self,
        _dom: &Dom,
        _element: NodeId,
        _name: &str,
        _old_value: Option<&str>,
        _new_value: Option<&str>,
    ) {
    }

    /// Upcast for downcasting back to the concrete type
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Builds the per-element reactions when an element is upgraded
pub trait CustomElementConstructor {
    fn construct(&self, dom: &Dom, element: NodeId) -> DomResult<Rc<dyn CustomElementReactions>>;
}

impl<F> CustomElementConstructor for F
where
    F: Fn(&Dom, NodeId) -> DomResult<Rc<dyn CustomElementReactions>>,
{
    fn construct(&self, dom: &Dom, element: NodeId) -> DomResult<Rc<dyn CustomElementReactions>> {
        self(dom, element)
    }
}

/// Custom element definition
#[derive(Clone)]
pub struct CustomElementDefinition {
    pub name: String,
    /// Built-in tag this definition customizes (`is="..."`)
    pub extends: Option<String>,
    pub observed_attributes: Vec<String>,
    pub constructor: Rc<dyn CustomElementConstructor>,
}

impl CustomElementDefinition {
    /// Local name of elements created for this definition
    pub fn local_name(&self) -> &str {
        self.extends.as_deref().unwrap_or(&self.name)
    }

    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes.iter().any(|a| a == attribute)
    }
}

impl fmt::Debug for CustomElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomElementDefinition")
            .field("name", &self.name)
            .field("extends", &self.extends)
            .field("observed_attributes", &self.observed_attributes)
            .finish_non_exhaustive()
    }
}

/// Custom element options
#[derive(Debug, Clone, Default)]
pub struct CustomElementOptions {
    pub extends: Option<String>,
    pub observed_attributes: Vec<String>,
}

/// Custom elements registry
#[derive(Debug, Default)]
pub struct CustomElementRegistry {
    definitions: HashMap<String, Rc<CustomElementDefinition>>,
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a custom element
    pub fn define(
        &mut self,
        name: &str,
        constructor: Rc<dyn CustomElementConstructor>,
        options: CustomElementOptions,
    ) -> Result<Rc<CustomElementDefinition>, CustomElementError> {
        if !Self::is_valid_name(name) {
            return Err(CustomElementError::InvalidName(name.to_string()));
        }
        if self.definitions.contains_key(name) {
            return Err(CustomElementError::AlreadyDefined(name.to_string()));
        }
        if let Some(base) = &options.extends {
            // only built-in elements can be customized
            if base.contains('-') || base.is_empty() {
                return Err(CustomElementError::InvalidExtends(base.clone()));
            }
        }

        let definition = Rc::new(CustomElementDefinition {
            name: name.to_string(),
            extends: options.extends.map(|e| e.to_ascii_lowercase()),
            observed_attributes: options.observed_attributes,
            constructor,
        });
        self.definitions.insert(name.to_string(), Rc::clone(&definition));
        tracing::debug!("Defined custom element <{}>", name);
        Ok(definition)
    }

    /// Get element definition
    pub fn get(&self, name: &str) -> Option<Rc<CustomElementDefinition>> {
        self.definitions.get(name).cloned()
    }

    /// Check if element is defined
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Find the definition for an element with the given tag and `is` value
    pub fn lookup(&self, tag: &str, is: Option<&str>) -> Option<Rc<CustomElementDefinition>> {
        let name = is.unwrap_or(tag);
        let definition = self.definitions.get(name)?;
        (definition.local_name() == tag).then(|| Rc::clone(definition))
    }

    /// Validate custom element name
    pub fn is_valid_name(name: &str) -> bool {
        if !name.contains('-') {
            return false;
        }

        if !name.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
            return false;
        }

        if name.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace()) {
            return false;
        }

        let reserved = ["annotation-xml", "color-profile", "font-face",
                       "font-face-src", "font-face-uri", "font-face-format",
                       "font-face-name", "missing-glyph"];
        !reserved.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert;

    impl CustomElementReactions for Inert {
        fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }
    }

    fn constructor() -> Rc<dyn CustomElementConstructor> {
        Rc::new(|_: &Dom, _: NodeId| -> DomResult<Rc<dyn CustomElementReactions>> { Ok(Rc::new(Inert)) })
    }

    #[test]
    fn test_valid_names() {
        assert!(CustomElementRegistry::is_valid_name("my-element"));
        assert!(CustomElementRegistry::is_valid_name("app-header"));
        assert!(!CustomElementRegistry::is_valid_name("myelement")); // no hyphen
        assert!(!CustomElementRegistry::is_valid_name("My-Element")); // uppercase
        assert!(!CustomElementRegistry::is_valid_name("font-face"));
        assert!(!CustomElementRegistry::is_valid_name("-lead"));
    }

    #[test]
    fn test_define() {
        let mut registry = CustomElementRegistry::new();

        assert!(registry.define("my-element", constructor(), CustomElementOptions::default()).is_ok());
        assert!(registry.is_defined("my-element"));

        assert_eq!(
            registry.define("my-element", constructor(), CustomElementOptions::default()).err(),
            Some(CustomElementError::AlreadyDefined("my-element".into()))
        );
    }

    #[test]
    fn test_lookup_customized_builtin() {
        let mut registry = CustomElementRegistry::new();
        let options = CustomElementOptions {
            extends: Some("button".into()),
            observed_attributes: vec!["label".into()],
        };
        registry.define("fancy-button", constructor(), options).unwrap();

        assert!(registry.lookup("button", Some("fancy-button")).is_some());
        assert!(registry.lookup("fancy-button", None).is_none());
        assert!(registry.lookup("div", Some("fancy-button")).is_none());
        assert!(registry.get("fancy-button").unwrap().observes("label"));
    }

    #[test]
    fn test_invalid_extends() {
        let mut registry = CustomElementRegistry::new();
        let options = CustomElementOptions {
            extends: Some("other-element".into()),
            ..Default::default()
        };
        assert_eq!(
            registry.define("x-y", constructor(), options).err(),
            Some(CustomElementError::InvalidExtends("other-element".into()))
        );
    }
}
