//! Dom handle
//!
//! `Dom` wraps the arena tree together with listeners and the custom element
//! registry, and runs lifecycle reactions as the tree changes. It is a cheap
//! `Rc` handle; clones share the same document.
//!
//! No `RefCell` borrow is held while user code (listeners, constructors,
//! reactions) runs.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use crate::events::EventListenerRegistry;
use crate::{
    Attribute, CustomElementConstructor, CustomElementDefinition, CustomElementOptions,
    CustomElementReactions, CustomElementRegistry, DomError, DomResult, DomTree, Event, Listener,
    ListenerId, ListenerOptions, NodeData, NodeId, SelectorList, ShadowRootMode,
};

/// Upgraded element: its definition and live reactions
struct UpgradedElement {
    definition: Rc<CustomElementDefinition>,
    reactions: Rc<dyn CustomElementReactions>,
}

struct DomInner {
    tree: RefCell<DomTree>,
    listeners: RefCell<EventListenerRegistry>,
    registry: RefCell<CustomElementRegistry>,
    upgraded: RefCell<HashMap<NodeId, UpgradedElement>>,
    head: NodeId,
    body: NodeId,
}

/// Shared DOM handle
#[derive(Clone)]
pub struct Dom {
    inner: Rc<DomInner>,
}

impl Dom {
    /// Create a document with `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let root = tree.root();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        // freshly created nodes always satisfy the hierarchy rules
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            inner: Rc::new(DomInner {
                tree: RefCell::new(tree),
                listeners: RefCell::new(EventListenerRegistry::default()),
                registry: RefCell::new(CustomElementRegistry::new()),
                upgraded: RefCell::new(HashMap::new()),
                head,
                body,
            }),
        }
    }

    /// The main document node
    pub fn document(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn head(&self) -> NodeId {
        self.inner.head
    }

    pub fn body(&self) -> NodeId {
        self.inner.body
    }

    /// Read access to the raw tree
    pub fn tree(&self) -> Ref<'_, DomTree> {
        self.inner.tree.borrow()
    }

    /// Raw mutable tree access; changes made here run no reactions
    pub fn tree_mut(&self) -> RefMut<'_, DomTree> {
        self.inner.tree.borrow_mut()
    }

    /// Whether two handles share the same document
    pub fn ptr_eq(&self, other: &Dom) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ---- node creation ----

    /// Create an element in the main document, upgrading it when its tag is defined
    pub fn create_element(&self, tag: &str) -> DomResult<NodeId> {
        self.create_element_in(self.document(), tag, None)
    }

    /// Create a customized built-in element (`<tag is="name">`)
    pub fn create_element_with_is(&self, tag: &str, is: &str) -> DomResult<NodeId> {
        self.create_element_in(self.document(), tag, Some(is))
    }

    /// Create an element owned by `owner`
    pub fn create_element_in(&self, owner: NodeId, tag: &str, is: Option<&str>) -> DomResult<NodeId> {
        let id = {
            let mut tree = self.tree_mut();
            let id = tree.create_element_in(owner, tag);
            if let Some(elem) = tree.element_mut(id) {
                elem.is = is.map(str::to_string);
            }
            id
        };
        self.upgrade(id)?;
        Ok(id)
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.tree_mut().create_text_in(self.document(), text)
    }

    pub fn create_comment(&self, text: &str) -> NodeId {
        self.tree_mut().create_comment_in(self.document(), text)
    }

    pub fn create_fragment(&self) -> NodeId {
        self.tree_mut().create_fragment_in(self.document())
    }

    /// Create a new, empty document in the same arena
    pub fn create_document(&self) -> NodeId {
        self.tree_mut().create_document()
    }

    /// Copy a node, upgrading defined elements of the copy
    pub fn clone_node(&self, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let copy = self.tree_mut().clone_node(id, deep)?;
        let elements: Vec<NodeId> = {
            let tree = self.tree();
            std::iter::once(copy)
                .chain(tree.descendants(copy))
                .filter(|&n| tree.get(n).is_some_and(|n| n.is_element()))
                .collect()
        };
        for element in elements {
            self.upgrade(element)?;
        }
        Ok(copy)
    }

    // ---- tree mutation ----

    /// Append `child` under `parent`; a fragment contributes its children
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let is_fragment = {
            let tree = self.tree();
            let node = tree.get(child).ok_or(DomError::NotFound(child))?;
            matches!(node.data, NodeData::DocumentFragment)
        };
        if is_fragment {
            let children = self.tree().child_ids(child);
            for node in children {
                self.insert(parent, node)?;
            }
            return Ok(());
        }
        self.insert(parent, child)
    }

    fn insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let (had_parent, child_owner, parent_owner) = {
            let tree = self.tree();
            tree.ensure_pre_insert(parent, child)?;
            let parent_owner = match tree.get(parent) {
                Some(node) if node.is_document() => parent,
                Some(node) => node.owner,
                None => return Err(DomError::NotFound(parent)),
            };
            (tree.parent(child).is_some(), tree.owner_document(child), parent_owner)
        };

        if had_parent {
            self.remove(child)?;
        }
        if child_owner != Some(parent_owner) {
            self.adopt_node(parent_owner, child)?;
        }

        self.tree_mut().append_child(parent, child)?;
        tracing::trace!("Inserted {:?} under {:?}", child, parent);

        if self.tree().is_connected(child) {
            self.run_connected(child)?;
        }
        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let was_connected = self.tree().is_connected(child);
        self.tree_mut().remove_child(parent, child)?;
        tracing::trace!("Removed {:?} from {:?}", child, parent);
        if was_connected {
            self.run_disconnected(child);
        }
        Ok(())
    }

    /// Remove a node from its parent, if it has one
    pub fn remove(&self, node: NodeId) -> DomResult<()> {
        let parent = self.tree().parent(node);
        match parent {
            Some(parent) => self.remove_child(parent, node),
            None => Ok(()),
        }
    }

    /// Remove every child of `node`
    pub fn clear_children(&self, node: NodeId) -> DomResult<()> {
        let children = self.tree().child_ids(node);
        for child in children {
            self.remove_child(node, child)?;
        }
        Ok(())
    }

    /// Move a subtree into `document`, running adopted reactions
    pub fn adopt_node(&self, document: NodeId, node: NodeId) -> DomResult<()> {
        let old_owner = {
            let tree = self.tree();
            if !tree.get(document).is_some_and(|n| n.is_document()) {
                return Err(DomError::HierarchyRequest);
            }
            let target = tree.get(node).ok_or(DomError::NotFound(node))?;
            if matches!(target.data, NodeData::Document | NodeData::ShadowRoot(_)) {
                return Err(DomError::HierarchyRequest);
            }
            target.owner
        };

        self.remove(node)?;
        if old_owner == document {
            return Ok(());
        }
        self.tree_mut().set_owner_recursive(node, document);
        tracing::trace!("Adopted {:?} into document {:?}", node, document);

        for (element, reactions) in self.reactions_in(node) {
            reactions.adopted(self, element);
        }
        Ok(())
    }

    // ---- attributes ----

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.tree().element(node)?.get_attr(name).map(str::to_string)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.tree().element(node).is_some_and(|e| e.has_attr(name))
    }

    /// Attribute names in insertion order
    pub fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.tree()
            .element(node)
            .map(|e| e.attrs.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn attributes(&self, node: NodeId) -> Vec<Attribute> {
        self.tree().element(node).map(|e| e.attrs.clone()).unwrap_or_default()
    }

    /// Set an attribute, notifying the element when the name is observed
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        let old = self
            .tree_mut()
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?
            .set_attr(name, value);
        tracing::trace!("Set attribute {}={:?} on {:?}", name, value, node);
        self.attribute_changed(node, name, old.as_deref(), Some(value));
        Ok(())
    }

    /// Remove an attribute; absent attributes are ignored
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> DomResult<()> {
        let old = self
            .tree_mut()
            .element_mut(node)
            .ok_or(DomError::NotAnElement(node))?
            .remove_attr(name);
        if old.is_some() {
            tracing::trace!("Removed attribute {} from {:?}", name, node);
            self.attribute_changed(node, name, old.as_deref(), None);
        }
        Ok(())
    }

    fn attribute_changed(&self, node: NodeId, name: &str, old: Option<&str>, new: Option<&str>) {
        let reactions = self
            .inner
            .upgraded
            .borrow()
            .get(&node)
            .filter(|u| u.definition.observes(name))
            .map(|u| Rc::clone(&u.reactions));
        if let Some(reactions) = reactions {
            reactions.attribute_changed(self, node, name, old, new);
        }
    }

    // ---- text ----

    pub fn text_content(&self, node: NodeId) -> String {
        self.tree().text_content(node)
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&self, node: NodeId, text: &str) -> DomResult<()> {
        self.clear_children(node)?;
        if !text.is_empty() {
            let owner = self.tree().owner_document(node).ok_or(DomError::NotFound(node))?;
            let text = self.tree_mut().create_text_in(owner, text);
            self.append_child(node, text)?;
        }
        Ok(())
    }

    // ---- shadow DOM ----

    /// Attach a shadow root to `host`
    pub fn attach_shadow(&self, host: NodeId, mode: ShadowRootMode) -> DomResult<NodeId> {
        let shadow = self.tree_mut().create_shadow_root(host, mode)?;
        tracing::trace!("Attached {} shadow root {:?} to {:?}", mode.as_str(), shadow, host);
        Ok(shadow)
    }

    /// Shadow root of `host`, if attached in open mode
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let tree = self.tree();
        let shadow = tree.element(host)?.shadow_root()?;
        let data = tree.get(shadow)?.as_shadow_root()?;
        (data.mode == ShadowRootMode::Open).then_some(shadow)
    }

    // ---- queries ----

    /// First element under `root` (light tree only) matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let tree = self.tree();
        Ok(tree.descendants(root).into_iter().find(|&id| list.matches(&tree, id)))
    }

    /// All elements under `root` (light tree only) matching `selector`, in tree order
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let tree = self.tree();
        Ok(tree.descendants(root).into_iter().filter(|&id| list.matches(&tree, id)).collect())
    }

    /// Whether the element matches `selector`
    pub fn matches(&self, node: NodeId, selector: &str) -> DomResult<bool> {
        let list = SelectorList::parse(selector)?;
        Ok(list.matches(&self.tree(), node))
    }

    // ---- events ----

    /// Add an event listener
    pub fn add_event_listener<F>(&self, node: NodeId, event_type: &str, listener: F) -> ListenerId
    where
        F: Fn(&mut Event) + 'static,
    {
        self.add_event_listener_with(node, event_type, Rc::new(listener), ListenerOptions::default())
    }

    pub fn add_event_listener_with(
        &self,
        node: NodeId,
        event_type: &str,
        listener: Listener,
        options: ListenerOptions,
    ) -> ListenerId {
        self.inner.listeners.borrow_mut().add(node, event_type, listener, options)
    }

    /// Remove an event listener, returning whether it was registered
    pub fn remove_event_listener(&self, node: NodeId, id: ListenerId) -> bool {
        self.inner.listeners.borrow_mut().remove(node, id)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.inner.listeners.borrow().count(node, event_type)
    }

    /// Dispatch an event at `target`
    ///
    /// The propagation path runs from the target up through its ancestors.
    /// A shadow root hands the event to its host only for composed events,
    /// and listeners on the host see the host as the target. Non-bubbling
    /// events reach only the target and the hosts it was retargeted to.
    /// Returns `false` if a listener called `prevent_default`.
    pub fn dispatch_event(&self, target: NodeId, event: &mut Event) -> bool {
        let path = self.event_path(target, event.composed);
        tracing::trace!("Dispatching '{}' at {:?} ({} nodes)", event.event_type, target, path.len());

        for (node, retarget, at_target) in path {
            if !at_target && !event.bubbles {
                continue;
            }
            event.target = retarget;
            event.current_target = node;
            self.invoke_listeners(node, event);
            if event.is_propagation_stopped() {
                break;
            }
        }
        !event.is_default_prevented()
    }

    /// (node, target seen at node, at-target phase)
    fn event_path(&self, target: NodeId, composed: bool) -> Vec<(NodeId, NodeId, bool)> {
        let tree = self.tree();
        let mut path = vec![(target, target, true)];
        let mut current = target;
        let mut retarget = target;
        loop {
            if let Some(parent) = tree.parent(current) {
                path.push((parent, retarget, false));
                current = parent;
            } else if let Some(host) = tree.host(current) {
                if !composed {
                    break;
                }
                retarget = host;
                path.push((host, host, true));
                current = host;
            } else {
                break;
            }
        }
        path
    }

    fn invoke_listeners(&self, node: NodeId, event: &mut Event) {
        let snapshot = self.inner.listeners.borrow().matching(node, &event.event_type);
        for (id, listener, once) in snapshot {
            if !self.inner.listeners.borrow().contains(node, id) {
                continue;
            }
            if once {
                self.inner.listeners.borrow_mut().remove(node, id);
            }
            listener(event);
        }
    }

    // ---- custom elements ----

    /// Define a custom element and upgrade matching connected elements
    pub fn define(
        &self,
        name: &str,
        constructor: Rc<dyn CustomElementConstructor>,
        options: CustomElementOptions,
    ) -> DomResult<()> {
        let definition = self.inner.registry.borrow_mut().define(name, constructor, options)?;

        let candidates: Vec<NodeId> = {
            let tree = self.tree();
            let documents = (0..tree.len() as u32)
                .map(NodeId)
                .filter(|&id| tree.get(id).is_some_and(|n| n.is_document()));
            documents
                .flat_map(|doc| tree.shadow_including_inclusive_descendants(doc))
                .filter(|&id| {
                    tree.element(id).is_some_and(|e| {
                        e.tag == definition.local_name()
                            && e.is.as_deref().unwrap_or(&e.tag) == definition.name
                    })
                })
                .collect()
        };
        for element in candidates {
            self.upgrade(element)?;
        }
        Ok(())
    }

    pub fn get_definition(&self, name: &str) -> Option<Rc<CustomElementDefinition>> {
        self.inner.registry.borrow().get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.inner.registry.borrow().is_defined(name)
    }

    /// Upgrade an element whose tag has a definition
    ///
    /// Runs the constructor, then attribute-changed reactions for observed
    /// attributes already present, then connected if the element is in a
    /// document. Returns `false` when there is nothing to upgrade.
    pub fn upgrade(&self, node: NodeId) -> DomResult<bool> {
        if self.inner.upgraded.borrow().contains_key(&node) {
            return Ok(false);
        }
        let definition = {
            let tree = self.tree();
            let Some(elem) = tree.element(node) else {
                return Ok(false);
            };
            self.inner.registry.borrow().lookup(&elem.tag, elem.is.as_deref())
        };
        let Some(definition) = definition else {
            return Ok(false);
        };

        tracing::debug!("Upgrading {:?} as <{}>", node, definition.name);
        let reactions = definition.constructor.construct(self, node)?;
        self.inner.upgraded.borrow_mut().insert(node, UpgradedElement {
            definition: Rc::clone(&definition),
            reactions: Rc::clone(&reactions),
        });

        let present: Vec<Attribute> = self
            .attributes(node)
            .into_iter()
            .filter(|a| definition.observes(&a.name))
            .collect();
        for attr in present {
            reactions.attribute_changed(self, node, &attr.name, None, Some(&attr.value));
        }

        if self.tree().is_connected(node) {
            reactions.connected(self, node);
        }
        Ok(true)
    }

    /// Reactions of an upgraded element
    pub fn reactions(&self, node: NodeId) -> Option<Rc<dyn CustomElementReactions>> {
        self.inner.upgraded.borrow().get(&node).map(|u| Rc::clone(&u.reactions))
    }

    /// Definition an element was upgraded with
    pub fn definition_of(&self, node: NodeId) -> Option<Rc<CustomElementDefinition>> {
        self.inner.upgraded.borrow().get(&node).map(|u| Rc::clone(&u.definition))
    }

    /// Upgraded elements in `root`'s shadow-including subtree, in tree order
    fn reactions_in(&self, root: NodeId) -> Vec<(NodeId, Rc<dyn CustomElementReactions>)> {
        let nodes = self.tree().shadow_including_inclusive_descendants(root);
        let upgraded = self.inner.upgraded.borrow();
        nodes
            .into_iter()
            .filter_map(|n| upgraded.get(&n).map(|u| (n, Rc::clone(&u.reactions))))
            .collect()
    }

    fn run_connected(&self, root: NodeId) -> DomResult<()> {
        let nodes = self.tree().shadow_including_inclusive_descendants(root);
        for node in nodes {
            match self.reactions(node) {
                Some(reactions) => reactions.connected(self, node),
                None => {
                    if self.tree().get(node).is_some_and(|n| n.is_element()) {
                        self.upgrade(node)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn run_disconnected(&self, root: NodeId) {
        for (element, reactions) in self.reactions_in(root) {
            reactions.disconnected(self, element);
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.tree().len())
            .field("upgraded", &self.inner.upgraded.borrow().len())
            .finish()
    }
}
