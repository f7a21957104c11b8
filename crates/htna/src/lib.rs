//! HTNA - declarative custom elements
//!
//! A component is a tag name plus a [`ComponentConfig`]: a render function,
//! optional scoped style, a controller and an attribute schema. The schema
//! drives typed attribute access, observed attributes and property sugar;
//! the controller's callbacks and listeners are bound to the element
//! lifecycle driven by the host [`Dom`].
//!
//! ```ignore
//! let htna = Htna::new(Dom::new(), Options::default());
//! htna.define("widget-a", ComponentConfig::new().render(|_| "<b>hi</b>"))?;
//! let widget = htna.instantiate("widget-a")?;
//! ```

mod attributes;
mod context;
mod controller;
mod definition;
mod dom_access;
mod element;
mod error;
mod form_input;
mod options;
mod registry;
mod rich_data;
mod schema;
mod slot_access;
mod style_access;
mod types;
mod util;
mod value;

pub use attributes::AttributesAccess;
pub use context::{ComponentHandle, Htna};
pub use controller::{
    AttributeChangedFn, AttributeChangedHandler, Callback, ControllerArgs, ControllerResult,
    PropertyDescriptor,
};
pub use definition::{ComponentConfig, ComponentDefinition, ControllerFn, RenderFn, Template};
pub use dom_access::{DomAccess, EventSource, EventWaiter};
pub use element::DefinedElement;
pub use error::{HtnaError, Result};
pub use form_input::{FormInputType, FORM_INPUT_CLASS};
pub use options::Options;
pub use registry::DefinitionRegistry;
pub use rich_data::RichDataStore;
pub use schema::{AttributeSpec, AttributesMap, AttributesSchema};
pub use slot_access::{SlotAccess, SlotContent};
pub use style_access::StyleAccess;
pub use types::{AttributeType, Codec, CustomType, TypeRegistry};
pub use util::camel_case;
pub use value::{AttributeValue, RichValue};

pub use htna_dom::{Dom, Event, NodeId, ShadowRootMode};
