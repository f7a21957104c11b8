//! Typed attribute access
//!
//! Reads parse the raw attribute string with the schema type; writes
//! serialize through it. Names without a schema type behave as plain
//! strings, so a missing schema entry never fails.

use std::rc::Rc;

use htna_dom::{Dom, NodeId};
use indexmap::IndexMap;

use crate::{AttributeType, AttributeValue, AttributesMap, Result, TypeRegistry};

/// Attribute accessor bound to one element and its component's type map
#[derive(Clone)]
pub struct AttributesAccess {
    dom: Dom,
    node: NodeId,
    types: Rc<IndexMap<String, AttributeType>>,
    registry: TypeRegistry,
}

impl AttributesAccess {
    pub fn new(dom: Dom, node: NodeId, types: Rc<IndexMap<String, AttributeType>>, registry: TypeRegistry) -> Self {
        Self { dom, node, types, registry }
    }

    /// Element the accessor is bound to
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Schema type of an attribute
    pub fn type_of(&self, name: &str) -> Option<&AttributeType> {
        self.types.get(name)
    }

    /// Raw string value
    pub fn raw(&self, name: &str) -> Option<String> {
        self.dom.get_attribute(self.node, name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.dom.has_attribute(self.node, name)
    }

    /// Typed value; `Null` for absent untyped attributes
    pub fn get(&self, name: &str) -> AttributeValue {
        let raw = self.raw(name);
        match self.types.get(name) {
            Some(ty) => self.registry.parse(ty, raw.as_deref(), name),
            None => raw.map_or(AttributeValue::Null, AttributeValue::String),
        }
    }

    /// Write a value; a serializer result of `None` removes the attribute
    pub fn set(&self, name: &str, value: impl Into<AttributeValue>) -> Result<()> {
        let value = value.into();
        let previous = self.raw(name);
        let serialized = match self.types.get(name) {
            Some(AttributeType::RichData) if !value.is_null() => {
                Some(self.store_rich_data(name, value, previous.as_deref()))
            }
            Some(ty) => self.registry.serialize(ty, &value, name),
            None if value.is_null() => None,
            None => Some(value.to_string()),
        };
        tracing::trace!("Attribute {} on {:?} <- {:?}", name, self.node, serialized);

        match serialized {
            Some(raw) => self.dom.set_attribute(self.node, name, &raw)?,
            None => {
                self.release_rich_data(name, previous.as_deref());
                self.dom.remove_attribute(self.node, name)?;
            }
        }
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let previous = self.raw(name);
        self.release_rich_data(name, previous.as_deref());
        self.dom.remove_attribute(self.node, name)?;
        Ok(())
    }

    /// Snapshot of every present attribute as typed values, in attribute order
    pub fn get_map(&self) -> AttributesMap {
        self.dom
            .attribute_names(self.node)
            .into_iter()
            .map(|name| {
                let value = self.get(&name);
                (name, value)
            })
            .collect()
    }

    /// `set` for each entry, in map order
    pub fn set_map(&self, map: &AttributesMap) -> Result<()> {
        for (name, value) in map {
            self.set(name, value.clone())?;
        }
        Ok(())
    }

    /// Token for `value`, kept stable while this attribute owns it
    fn store_rich_data(&self, name: &str, value: AttributeValue, previous: Option<&str>) -> String {
        let dom = &self.dom;
        self.registry.rich_data().store_for(self.node, name, value, previous, |token| {
            dom.tree()
                .iter()
                .filter_map(|(_, node)| node.as_element())
                .any(|elem| elem.attrs.iter().any(|attr| attr.value == token))
        })
    }

    /// Release the token this attribute owns; copied or foreign tokens stay
    fn release_rich_data(&self, name: &str, previous: Option<&str>) {
        if self.types.get(name) != Some(&AttributeType::RichData) {
            return;
        }
        if let Some(token) = previous {
            self.registry.rich_data().release_for(self.node, name, token);
        }
    }
}

impl std::fmt::Debug for AttributesAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributesAccess")
            .field("node", &self.node)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}
