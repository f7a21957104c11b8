//! Component configuration and compiled definitions

use std::fmt;
use std::rc::Rc;

use htna_dom::{NodeId, ShadowRootMode};
use indexmap::IndexMap;

use crate::{
    camel_case, AttributeSpec, AttributeType, AttributeValue, AttributesMap, AttributesSchema,
    ControllerArgs, ControllerResult, FormInputType, Options,
};

/// Render function producing the initial shadow content
pub type RenderFn = Rc<dyn Fn(&ControllerArgs) -> Template>;

/// Controller function; `None` stands for an empty result
pub type ControllerFn = Rc<dyn Fn(&ControllerArgs) -> Option<ControllerResult>>;

/// Shadow content returned by `render`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Template {
    /// Markup parsed into the shadow root
    Markup(String),
    /// Node (element or fragment) appended as is
    Node(NodeId),
    /// `<template>` element whose content is deep-cloned
    Template(NodeId),
    #[default]
    Empty,
}

impl From<&str> for Template {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_string())
    }
}

impl From<String> for Template {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

impl From<NodeId> for Template {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// Declarative component configuration
#[derive(Clone, Default)]
pub struct ComponentConfig {
    pub render: Option<RenderFn>,
    /// CSS for the shadow tree
    pub style: Option<String>,
    pub controller: Option<ControllerFn>,
    pub attributes_schema: AttributesSchema,
    /// Initial attribute values, written at first connection when absent
    pub attributes: AttributesMap,
    /// Shadow root mode; `Options::default_mode` when unset
    pub mode: Option<ShadowRootMode>,
    /// Built-in tag to customize
    pub extends: Option<String>,
    /// Keep a form input in the light tree in sync with the element
    pub form_input: Option<FormInputType>,
}

impl ComponentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render<F, T>(mut self, render: F) -> Self
    where
        F: Fn(&ControllerArgs) -> T + 'static,
        T: Into<Template>,
    {
        self.render = Some(Rc::new(move |args: &ControllerArgs| -> Template { render(args).into() }));
        self
    }

    pub fn style(mut self, css: &str) -> Self {
        self.style = Some(css.to_string());
        self
    }

    pub fn controller<F, R>(mut self, controller: F) -> Self
    where
        F: Fn(&ControllerArgs) -> R + 'static,
        R: Into<Option<ControllerResult>>,
    {
        self.controller = Some(Rc::new(move |args: &ControllerArgs| -> Option<ControllerResult> {
            controller(args).into()
        }));
        self
    }

    /// Declare one attribute of the schema
    pub fn attribute(mut self, name: &str, spec: AttributeSpec) -> Self {
        self.attributes_schema.insert(name.to_string(), spec);
        self
    }

    /// Initial value for an attribute
    pub fn initial(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn mode(mut self, mode: ShadowRootMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn extends(mut self, tag: &str) -> Self {
        self.extends = Some(tag.to_ascii_lowercase());
        self
    }

    pub fn form_input(mut self, kind: FormInputType) -> Self {
        self.form_input = Some(kind);
        self
    }
}

impl fmt::Debug for ComponentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentConfig")
            .field("render", &self.render.is_some())
            .field("style", &self.style)
            .field("controller", &self.controller.is_some())
            .field("attributes_schema", &self.attributes_schema)
            .field("attributes", &self.attributes)
            .field("mode", &self.mode)
            .field("extends", &self.extends)
            .field("form_input", &self.form_input)
            .finish()
    }
}

/// Compiled, immutable component definition
pub struct ComponentDefinition {
    pub(crate) render: Option<RenderFn>,
    pub(crate) style: Option<String>,
    pub(crate) controller: Option<ControllerFn>,
    pub(crate) schema: AttributesSchema,
    pub(crate) types: Rc<IndexMap<String, AttributeType>>,
    pub(crate) observed: Vec<String>,
    /// (attribute, property) pairs for schema property sugar
    pub(crate) properties: Vec<(String, String)>,
    pub(crate) defaults: AttributesMap,
    pub(crate) mode: ShadowRootMode,
    pub(crate) extends: Option<String>,
    pub(crate) form_input: Option<FormInputType>,
    pub(crate) scoped_style_class: Rc<str>,
    pub(crate) slot_wrapper: Rc<str>,
}

impl ComponentDefinition {
    /// Compile a configuration
    ///
    /// Schema defaults come first; the config's initial attributes override
    /// them name by name.
    pub fn compile(config: &ComponentConfig, options: &Options) -> Self {
        let mut types = IndexMap::new();
        let mut observed = Vec::new();
        let mut properties = Vec::new();
        let mut defaults = AttributesMap::new();

        for (name, spec) in &config.attributes_schema {
            if let Some(ty) = &spec.ty {
                types.insert(name.clone(), ty.clone());
            }
            if spec.observed {
                observed.push(name.clone());
            }
            if spec.property {
                properties.push((name.clone(), camel_case(name)));
            }
            if let Some(value) = &spec.value {
                defaults.insert(name.clone(), value.clone());
            }
        }
        for (name, value) in &config.attributes {
            defaults.insert(name.clone(), value.clone());
        }
        if let Some(kind) = config.form_input {
            for name in kind.observed_attributes() {
                if !observed.iter().any(|o| o == name) {
                    observed.push(name.to_string());
                }
            }
        }

        Self {
            render: config.render.clone(),
            style: config.style.clone(),
            controller: config.controller.clone(),
            schema: config.attributes_schema.clone(),
            types: Rc::new(types),
            observed,
            properties,
            defaults,
            mode: config.mode.unwrap_or(options.default_mode),
            extends: config.extends.clone(),
            form_input: config.form_input,
            scoped_style_class: options.scoped_style_class.as_str().into(),
            slot_wrapper: options.default_slot_wrapper.as_str().into(),
        }
    }

    pub fn schema(&self) -> &AttributesSchema {
        &self.schema
    }

    /// Attribute name → type for typed schema entries
    pub fn types(&self) -> &IndexMap<String, AttributeType> {
        &self.types
    }

    pub fn observed_attributes(&self) -> &[String] {
        &self.observed
    }

    /// Property names installed from the schema
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(_, property)| property.as_str())
    }

    pub fn defaults(&self) -> &AttributesMap {
        &self.defaults
    }

    pub fn mode(&self) -> ShadowRootMode {
        self.mode
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn form_input(&self) -> Option<FormInputType> {
        self.form_input
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("observed", &self.observed)
            .field("properties", &self.properties)
            .field("defaults", &self.defaults)
            .field("mode", &self.mode)
            .field("extends", &self.extends)
            .finish_non_exhaustive()
    }
}
