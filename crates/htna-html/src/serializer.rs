//! Markup serialization
//!
//! By default an element's markup covers its light children only, matching
//! `innerHTML`. With shadow roots enabled, each host emits its shadow tree
//! first as a declarative `<template shadowrootmode="...">`, which is handy
//! for inspecting rendered components.

use htna_dom::{DomTree, Node, NodeData, NodeId};

/// Elements that never have an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements whose text children are written unescaped
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Tree → markup writer
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSerializer {
    shadow_roots: bool,
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit shadow trees as declarative templates
    pub fn with_shadow_roots(mut self) -> Self {
        self.shadow_roots = true;
        self
    }

    /// Markup of the children of `node`
    pub fn serialize_inner(&self, tree: &DomTree, node: NodeId) -> String {
        let mut out = String::new();
        self.write_children(tree, node, &mut out);
        out
    }

    /// Markup of `node` itself
    pub fn serialize_outer(&self, tree: &DomTree, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(tree, node, &mut out);
        out
    }

    fn write_node(&self, tree: &DomTree, id: NodeId, out: &mut String) {
        let Some(node) = tree.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Element(elem) => {
                out.push('<');
                out.push_str(&elem.tag);
                for attr in &elem.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        out.push_str("=\"");
                        escape_into(&attr.value, true, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                    return;
                }

                if let Some(shadow) = elem.shadow_root().filter(|_| self.shadow_roots) {
                    self.write_shadow(tree, shadow, out);
                }
                if RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str()) {
                    tree.children(id).filter_map(|(_, child)| child.as_text()).for_each(|text| out.push_str(text));
                } else {
                    self.write_children(tree, id, out);
                }
                out.push_str("</");
                out.push_str(&elem.tag);
                out.push('>');
            }
            NodeData::Text(text) => escape_into(&text.content, false, out),
            NodeData::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            NodeData::Document | NodeData::DocumentFragment | NodeData::ShadowRoot(_) => {
                self.write_children(tree, id, out);
            }
        }
    }

    fn write_shadow(&self, tree: &DomTree, shadow: NodeId, out: &mut String) {
        let Some(mode) = tree.get(shadow).and_then(Node::as_shadow_root).map(|s| s.mode) else {
            return;
        };
        out.push_str("<template shadowrootmode=\"");
        out.push_str(mode.as_str());
        out.push_str("\">");
        self.write_children(tree, shadow, out);
        out.push_str("</template>");
    }

    fn write_children(&self, tree: &DomTree, parent: NodeId, out: &mut String) {
        for (child, _) in tree.children(parent) {
            self.write_node(tree, child, out);
        }
    }
}

/// Escape `&`, `<`, `>`, and `"` too inside attribute values
fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Light-tree markup of the children of `node`
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node)
}

/// Light-tree markup of `node`
pub fn outer_html(tree: &DomTree, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node)
}
