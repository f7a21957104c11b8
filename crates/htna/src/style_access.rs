//! Style nodes of a component tree

use std::fmt;
use std::rc::Rc;

use htna_dom::{Dom, NodeId};

use crate::dom_access::owner_of;
use crate::Result;

/// Adds and removes `<style>` / `<link rel="stylesheet">` nodes under a root
#[derive(Clone)]
pub struct StyleAccess {
    dom: Dom,
    node: NodeId,
    scoped_class: Rc<str>,
}

impl StyleAccess {
    pub fn new(dom: Dom, node: NodeId, scoped_class: Rc<str>) -> Self {
        Self { dom, node, scoped_class }
    }

    /// Append an inline `<style type="text/css">` carrying the scoped class
    pub fn add_style(&self, css: &str) -> Result<NodeId> {
        let style = self.scoped_element("style", &[("type", "text/css")])?;
        self.dom.set_text_content(style, css)?;
        self.dom.append_child(self.node, style)?;
        Ok(style)
    }

    /// Append a stylesheet link; the URL is recorded, never fetched
    pub fn add_external_style(&self, url: &str) -> Result<NodeId> {
        let link = self.scoped_element("link", &[("rel", "stylesheet"), ("type", "text/css"), ("href", url)])?;
        self.dom.append_child(self.node, link)?;
        Ok(link)
    }

    /// Remove every style and stylesheet link under the root
    pub fn remove_all_styles(&self) -> Result<usize> {
        let styles = self.dom.query_selector_all(self.node, r#"style, link[rel="stylesheet"]"#)?;
        for &style in &styles {
            self.dom.remove(style)?;
        }
        Ok(styles.len())
    }

    fn scoped_element(&self, tag: &str, attrs: &[(&str, &str)]) -> Result<NodeId> {
        let owner = owner_of(&self.dom, self.node)?;
        let element = self.dom.create_element_in(owner, tag, None)?;
        self.dom.set_attribute(element, "class", &self.scoped_class)?;
        for (name, value) in attrs {
            self.dom.set_attribute(element, name, value)?;
        }
        Ok(element)
    }
}

impl fmt::Debug for StyleAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleAccess").field("node", &self.node).finish_non_exhaustive()
    }
}
