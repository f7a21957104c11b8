//! HTML5 fragment parser
//!
//! Uses html5ever's fragment algorithm with an RcDom sink and converts the
//! result into the host arena. The context element defaults to `template`,
//! which accepts any content (table rows, leading `<style>` or `<link>`)
//! and keeps whitespace as written.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, QualName, local_name, ns, parse_fragment as parse_html_fragment};
use htna_dom::{Dom, DomResult, DomTree, NodeData, NodeId};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 fragment parser bound to one document of a `Dom`
pub struct HtmlParser {
    owner: NodeId,
}

impl HtmlParser {
    /// Parser creating nodes owned by the main document
    pub fn new(dom: &Dom) -> Self {
        Self { owner: dom.document() }
    }

    /// Parser creating nodes owned by `owner`
    pub fn for_document(owner: NodeId) -> Self {
        Self { owner }
    }

    /// Parse markup into a detached document fragment
    ///
    /// Defined custom elements in the result are upgraded before returning.
    pub fn parse_fragment(&self, dom: &Dom, markup: &str) -> DomResult<NodeId> {
        self.parse_fragment_in(dom, markup, "template")
    }

    /// Parse markup as if it were the content of a `context` element
    pub fn parse_fragment_in(&self, dom: &Dom, markup: &str, context: &str) -> DomResult<NodeId> {
        let context = QualName::new(None, ns!(html), LocalName::from(context));
        let parsed =
            parse_html_fragment(RcDom::default(), Default::default(), context, Vec::new(), false).one(markup);

        let fragment = {
            let mut tree = dom.tree_mut();
            let fragment = tree.create_fragment_in(self.owner);
            if let Some(root) = fragment_root(&parsed.document) {
                for child in root.children.borrow().iter() {
                    self.convert_node(child, &mut tree, fragment)?;
                }
            }
            fragment
        };

        let elements: Vec<NodeId> = {
            let tree = dom.tree();
            tree.descendants(fragment)
                .into_iter()
                .filter(|&id| tree.get(id).is_some_and(|n| n.is_element()))
                .collect()
        };
        tracing::trace!("Parsed fragment {:?} with {} elements", fragment, elements.len());
        for element in elements {
            dom.upgrade(element)?;
        }
        Ok(fragment)
    }

    /// Convert an RcDom node into the arena under `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> DomResult<()> {
        match &handle.data {
            RcNodeData::Text { contents } => {
                let id = tree.create_text_in(self.owner, &contents.borrow());
                tree.append_child(parent, id)?;
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment_in(self.owner, contents);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element { name, attrs, template_contents, .. } => {
                let id = tree.create_element_in(self.owner, &name.local);
                if let Some(elem) = tree.element_mut(id) {
                    for attr in attrs.borrow().iter() {
                        let value = attr.value.to_string();
                        if &*attr.name.local == "is" {
                            elem.is = Some(value.clone());
                        }
                        elem.set_attr(&attr.name.local, &value);
                    }
                }
                tree.append_child(parent, id)?;

                // template content is kept as the template's own children
                if let Some(content) = template_contents.borrow().as_ref() {
                    for child in content.children.borrow().iter() {
                        self.convert_node(child, tree, id)?;
                    }
                }
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id)?;
                }
            }
            RcNodeData::Document | RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}
        }
        Ok(())
    }
}

/// The `<html>` element the fragment algorithm parks parsed nodes under
fn fragment_root(document: &Handle) -> Option<Handle> {
    document
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, RcNodeData::Element { name, .. } if name.local == local_name!("html")))
        .cloned()
}

/// Parse markup into a fragment owned by `owner`
pub fn parse_fragment(dom: &Dom, owner: NodeId, markup: &str) -> DomResult<NodeId> {
    HtmlParser::for_document(owner).parse_fragment(dom, markup)
}

/// Replace the children of `node` with parsed markup
///
/// Elements parse the markup in their own context; shadow roots, fragments
/// and documents use `template`.
pub fn set_inner_html(dom: &Dom, node: NodeId, markup: &str) -> DomResult<()> {
    let (owner, context) = {
        let tree = dom.tree();
        match tree.get(node) {
            Some(n) if matches!(n.data, NodeData::Document) => (node, None),
            Some(n) => (n.owner, n.as_element().map(|elem| elem.tag.clone())),
            None => return Err(htna_dom::DomError::NotFound(node)),
        }
    };
    dom.clear_children(node)?;
    let parser = HtmlParser::for_document(owner);
    let fragment = match context {
        Some(tag) => parser.parse_fragment_in(dom, markup, &tag)?,
        None => parser.parse_fragment(dom, markup)?,
    };
    dom.append_child(node, fragment)
}
