//! DOM Tree (arena-based allocation)
//!
//! Raw structural operations. Nothing here runs custom element reactions;
//! `Dom` layers those on top.

use crate::{
    DomError, DomResult, ElementData, Node, NodeData, NodeId, ShadowRootData, ShadowRootMode,
    TextData,
};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree holding a single empty document at `NodeId::ROOT`
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document, NodeId::ROOT)],
        }
    }

    /// The initial document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Every node in the arena, attached or not
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(index, node)| (NodeId(index as u32), node))
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: NodeData, owner: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data, owner));
        id
    }

    /// Create another, empty document sharing this arena
    pub fn create_document(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.push(NodeData::Document, id)
    }

    /// Create an element owned by the initial document
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_in(NodeId::ROOT, tag)
    }

    /// Create an element owned by `owner`
    pub fn create_element_in(&mut self, owner: NodeId, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag)), owner)
    }

    /// Create a text node owned by the initial document
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create_text_in(NodeId::ROOT, text)
    }

    pub fn create_text_in(&mut self, owner: NodeId, text: &str) -> NodeId {
        self.push(NodeData::Text(TextData { content: text.to_string() }), owner)
    }

    pub fn create_comment_in(&mut self, owner: NodeId, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()), owner)
    }

    pub fn create_fragment_in(&mut self, owner: NodeId) -> NodeId {
        self.push(NodeData::DocumentFragment, owner)
    }

    pub(crate) fn create_shadow_root(&mut self, host: NodeId, mode: ShadowRootMode) -> DomResult<NodeId> {
        let owner = self.get(host).ok_or(DomError::NotFound(host))?.owner;
        let elem = self.element(host).ok_or(DomError::NotAnElement(host))?;
        if elem.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let shadow = self.push(NodeData::ShadowRoot(ShadowRootData::new(host, mode)), owner);
        if let Some(elem) = self.get_mut(host).and_then(Node::as_element_mut) {
            elem.shadow_root = Some(shadow);
        }
        Ok(shadow)
    }

    /// Element data for a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::as_element)
    }

    /// Mutable element data for a node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(Node::as_element_mut)
    }

    /// Local tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Parent node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Host element of a shadow root
    pub fn host(&self, shadow: NodeId) -> Option<NodeId> {
        self.get(shadow).and_then(Node::as_shadow_root).map(|s| s.host)
    }

    /// Document owning the node
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.owner)
    }

    /// Parent, or the host when `id` is a shadow root
    fn parent_or_host(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).or_else(|| self.host(id))
    }

    /// Whether `ancestor` is `id` or one of its shadow-including ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent_or_host(node);
        }
        false
    }

    /// Whether the node is part of a document tree, through shadow hosts
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(next) = self.parent_or_host(current) {
            current = next;
        }
        self.get(current).is_some_and(Node::is_document)
    }

    /// Validate that `child` may be inserted under `parent`
    pub fn ensure_pre_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound(parent))?;
        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(DomError::HierarchyRequest);
        }
        let child_node = self.get(child).ok_or(DomError::NotFound(child))?;
        if matches!(child_node.data, NodeData::Document | NodeData::ShadowRoot(_)) {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.ensure_pre_insert(parent, child)?;
        self.detach(child);

        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let node = self.get(child).ok_or(DomError::NotFound(child))?;
        if node.parent != parent {
            return Err(DomError::NotAChild(child));
        }
        self.detach(child);
        Ok(())
    }

    /// Unlink a node from its parent, if any
    pub fn detach(&mut self, child: NodeId) {
        let Some(node) = self.get(child) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Iterate over direct children
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let next = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// Direct child IDs (snapshot)
    pub fn child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        self.children(parent).map(|(id, _)| id).collect()
    }

    /// First child that is an element
    pub fn first_element_child(&self, parent: NodeId) -> Option<NodeId> {
        self.children(parent).find(|(_, n)| n.is_element()).map(|(id, _)| id)
    }

    /// Descendants in tree order, excluding `id`, not entering shadow roots
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, false, &mut out);
        out
    }

    /// `id` and its descendants in tree order, entering shadow roots after their host
    pub fn shadow_including_inclusive_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        if let Some(shadow) = self.element(id).and_then(|e| e.shadow_root) {
            out.push(shadow);
            self.collect_descendants(shadow, true, &mut out);
        }
        self.collect_descendants(id, true, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, shadow_including: bool, out: &mut Vec<NodeId>) {
        for (child, node) in self.children(id) {
            out.push(child);
            if shadow_including {
                if let Some(shadow) = node.as_element().and_then(|e| e.shadow_root) {
                    out.push(shadow);
                    self.collect_descendants(shadow, true, out);
                }
            }
            self.collect_descendants(child, shadow_including, out);
        }
    }

    /// Reassign the owner document of a subtree, shadow trees included
    pub(crate) fn set_owner_recursive(&mut self, id: NodeId, owner: NodeId) {
        for node in self.shadow_including_inclusive_descendants(id) {
            if let Some(n) = self.get_mut(node) {
                n.owner = owner;
            }
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.get(d).and_then(Node::as_text))
            .collect()
    }

    /// Copy a node (and its light-tree descendants when `deep`), detached
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let node = self.get(id).ok_or(DomError::NotFound(id))?;
        let owner = node.owner;
        let data = match &node.data {
            NodeData::Document | NodeData::ShadowRoot(_) => return Err(DomError::HierarchyRequest),
            NodeData::Element(elem) => NodeData::Element(ElementData {
                tag: elem.tag.clone(),
                attrs: elem.attrs.clone(),
                is: elem.is.clone(),
                shadow_root: None,
            }),
            other => other.clone(),
        };
        let copy = self.push(data, owner);
        if deep {
            for child in self.child_ids(id) {
                let child_copy = self.clone_node(child, true)?;
                self.append_child(copy, child_copy)?;
            }
        }
        Ok(copy)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_siblings() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let a = tree.create_element("p");
        let b = tree.create_text("hi");

        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, a).unwrap();
        tree.append_child(div, b).unwrap();

        assert_eq!(tree.child_ids(div), vec![a, b]);
        assert_eq!(tree.get(a).unwrap().next_sibling, b);
        assert_eq!(tree.get(b).unwrap().prev_sibling, a);
        assert!(tree.is_connected(b));
    }

    #[test]
    fn test_detach_middle_child() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let kids: Vec<_> = (0..3).map(|_| tree.create_element("i")).collect();
        for &k in &kids {
            tree.append_child(div, k).unwrap();
        }

        tree.remove_child(div, kids[1]).unwrap();
        assert_eq!(tree.child_ids(div), vec![kids[0], kids[2]]);
        assert_eq!(tree.remove_child(div, kids[1]), Err(DomError::NotAChild(kids[1])));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();

        assert_eq!(tree.append_child(inner, outer), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(outer, outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_shadow_root_connectivity() {
        let mut tree = DomTree::new();
        let host = tree.create_element("x-host");
        let shadow = tree.create_shadow_root(host, ShadowRootMode::Closed).unwrap();
        let inner = tree.create_element("b");
        tree.append_child(shadow, inner).unwrap();

        assert!(!tree.is_connected(inner));
        tree.append_child(tree.root(), host).unwrap();
        assert!(tree.is_connected(inner));
        assert_eq!(tree.host(shadow), Some(host));
        assert_eq!(tree.create_shadow_root(host, ShadowRootMode::Open), Err(DomError::ShadowRootExists(host)));

        let all = tree.shadow_including_inclusive_descendants(host);
        assert_eq!(all, vec![host, shadow, inner]);
    }

    #[test]
    fn test_clone_deep() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.element_mut(div).unwrap().set_attr("id", "x");
        let text = tree.create_text("copy me");
        tree.append_child(div, text).unwrap();

        let copy = tree.clone_node(div, true).unwrap();
        assert_ne!(copy, div);
        assert_eq!(tree.element(copy).unwrap().id(), Some("x"));
        assert_eq!(tree.text_content(copy), "copy me");
        assert_eq!(tree.parent(copy), None);
    }
}
