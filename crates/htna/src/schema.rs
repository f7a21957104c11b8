//! Attribute schema

use indexmap::IndexMap;

use crate::{AttributeType, AttributeValue};

/// Ordered attribute name → value map
pub type AttributesMap = IndexMap<String, AttributeValue>;

/// Ordered attribute name → declaration map
pub type AttributesSchema = IndexMap<String, AttributeSpec>;

/// Declaration of one attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSpec {
    /// Coercion applied on read and write; untyped attributes stay raw strings
    pub ty: Option<AttributeType>,
    /// Changes reach the controller's attribute-changed handler
    pub observed: bool,
    /// Exposed as a camel-cased instance property
    pub property: bool,
    /// Default written at first connection when the attribute is absent
    pub value: Option<AttributeValue>,
}

impl AttributeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(ty: AttributeType) -> Self {
        Self { ty: Some(ty), ..Self::default() }
    }

    pub fn ty(mut self, ty: AttributeType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn observed(mut self) -> Self {
        self.observed = true;
        self
    }

    pub fn property(mut self) -> Self {
        self.property = true;
        self
    }

    pub fn value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}
