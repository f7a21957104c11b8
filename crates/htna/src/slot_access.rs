//! Slot content management on the light tree

use std::fmt;
use std::rc::Rc;

use htna_dom::{Dom, NodeId};

use crate::dom_access::owner_of;
use crate::value::format_number;
use crate::Result;

/// Content placed into a slot wrapper
#[derive(Debug, Clone, PartialEq)]
pub enum SlotContent {
    Text(String),
    Number(f64),
    /// Element, text node or fragment appended as is
    Node(NodeId),
}

impl From<&str> for SlotContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SlotContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for SlotContent {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for SlotContent {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<NodeId> for SlotContent {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// Light-tree children carrying a `slot` attribute
#[derive(Clone)]
pub struct SlotAccess {
    dom: Dom,
    node: NodeId,
    default_wrapper: Rc<str>,
}

impl SlotAccess {
    pub fn new(dom: Dom, node: NodeId, default_wrapper: Rc<str>) -> Self {
        Self { dom, node, default_wrapper }
    }

    /// First descendant assigned to `slot`
    pub fn get(&self, slot: &str) -> Option<NodeId> {
        let tree = self.dom.tree();
        tree.descendants(self.node)
            .into_iter()
            .find(|&id| tree.element(id).and_then(|e| e.get_attr("slot")) == Some(slot))
    }

    /// Wrap `content` in the default wrapper and append it for `slot`
    pub fn append(&self, slot: &str, content: impl Into<SlotContent>) -> Result<NodeId> {
        let wrapper = Rc::clone(&self.default_wrapper);
        self.append_with(slot, content, &wrapper)
    }

    pub fn append_with(&self, slot: &str, content: impl Into<SlotContent>, wrapper: &str) -> Result<NodeId> {
        let owner = owner_of(&self.dom, self.node)?;
        let slot_node = self.dom.create_element_in(owner, wrapper, None)?;
        self.dom.set_attribute(slot_node, "slot", slot)?;

        let child = match content.into() {
            SlotContent::Text(text) => self.dom.tree_mut().create_text_in(owner, &text),
            SlotContent::Number(n) => self.dom.tree_mut().create_text_in(owner, &format_number(n)),
            SlotContent::Node(node) => node,
        };
        self.dom.append_child(slot_node, child)?;
        self.dom.append_child(self.node, slot_node)?;
        tracing::trace!("Slot '{}' of {:?} filled with {:?}", slot, self.node, slot_node);
        Ok(slot_node)
    }

    /// `remove` then `append`
    pub fn replace(&self, slot: &str, content: impl Into<SlotContent>) -> Result<NodeId> {
        self.remove(slot)?;
        self.append(slot, content)
    }

    pub fn replace_with(&self, slot: &str, content: impl Into<SlotContent>, wrapper: &str) -> Result<NodeId> {
        self.remove(slot)?;
        self.append_with(slot, content, wrapper)
    }

    /// Detach the node assigned to `slot`, returning it
    pub fn remove(&self, slot: &str) -> Result<Option<NodeId>> {
        let Some(found) = self.get(slot) else {
            return Ok(None);
        };
        self.dom.remove(found)?;
        Ok(Some(found))
    }
}

impl fmt::Debug for SlotAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotAccess")
            .field("node", &self.node)
            .field("default_wrapper", &self.default_wrapper)
            .finish()
    }
}
