//! HTNA DOM - Host environment for custom elements
//!
//! Arena-based node tree with attributes, shadow roots, event dispatch and a
//! custom element registry that drives lifecycle reactions.

mod node;
mod tree;
mod shadow;
mod selector;
mod events;
mod custom_elements;
mod dom;
mod error;

pub use node::{Node, NodeData, ElementData, TextData, Attribute};
pub use tree::{DomTree, Children};
pub use shadow::{ShadowRootData, ShadowRootMode};
pub use selector::{SelectorList, ComplexSelector, CompoundSelector, SimpleSelector, Combinator};
pub use events::{Event, EventDetail, Listener, ListenerId, ListenerOptions};
pub use custom_elements::{
    CustomElementConstructor, CustomElementDefinition, CustomElementOptions,
    CustomElementReactions, CustomElementRegistry,
};
pub use dom::Dom;
pub use error::{CustomElementError, DomError, DomResult};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root document node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
