//! DOM access facade
//!
//! One facade wraps the light tree (the host element), another the shadow
//! root. Both offer scoped queries, custom event dispatch, one-shot event
//! waiting and content helpers.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use htna_dom::{Dom, DomError, Event, EventDetail, ListenerId, ListenerOptions, NodeId, SelectorList};
use smol::channel::{self, Receiver};

use crate::{HtnaError, Result, Template};

/// Node an `on`/`delegate` listener is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Node(NodeId),
    /// First match of a selector inside the facade's root
    Selector(String),
}

impl From<NodeId> for EventSource {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for EventSource {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

/// Scoped DOM helpers over an element or a shadow root
#[derive(Clone)]
pub struct DomAccess {
    dom: Dom,
    node: NodeId,
    scoped_class: Rc<str>,
}

impl DomAccess {
    pub fn new(dom: Dom, node: NodeId, scoped_class: Rc<str>) -> Self {
        Self { dom, node, scoped_class }
    }

    /// Root of this facade
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// First descendant matching `selector`
    ///
    /// An invalid selector matches nothing.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        match self.dom.query_selector(self.node, selector) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!("query {:?} on {:?} failed: {}", selector, self.node, err);
                None
            }
        }
    }

    /// Every descendant matching `selector`, in tree order
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        match self.dom.query_selector_all(self.node, selector) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!("query_all {:?} on {:?} failed: {}", selector, self.node, err);
                Vec::new()
            }
        }
    }

    /// Dispatch a composed, cancelable custom event at the root
    ///
    /// Returns `false` when a listener prevented the default action.
    pub fn dispatch(&self, name: &str, detail: Option<EventDetail>, bubbles: bool) -> bool {
        let mut event = Event::custom(name, detail, bubbles);
        self.dom.dispatch_event(self.node, &mut event)
    }

    /// Wait for the next `name` event at the root
    pub fn when(&self, name: &str) -> EventWaiter {
        EventWaiter::new(self.dom.clone(), self.node, name)
    }

    /// Attach a listener to `source`
    pub fn on(
        &self,
        source: impl Into<EventSource>,
        event_type: &str,
        listener: impl Fn(&mut Event) + 'static,
    ) -> Result<ListenerId> {
        let node = self.resolve(source.into())?;
        Ok(self.dom.add_event_listener(node, event_type, listener))
    }

    /// Attach a listener to `source` that only runs for targets matching
    /// `target_selector`
    pub fn delegate(
        &self,
        source: impl Into<EventSource>,
        event_type: &str,
        target_selector: &str,
        listener: impl Fn(&mut Event) + 'static,
    ) -> Result<ListenerId> {
        let node = self.resolve(source.into())?;
        let selector = SelectorList::parse(target_selector)?;
        let dom = self.dom.clone();
        let id = self.dom.add_event_listener(node, event_type, move |event: &mut Event| {
            let hit = selector.matches(&dom.tree(), event.target);
            if hit {
                listener(event);
            }
        });
        Ok(id)
    }

    /// Remove every child except the component's own style nodes
    pub fn empty(&self) -> Result<()> {
        let doomed: Vec<NodeId> = {
            let tree = self.dom.tree();
            tree.child_ids(self.node)
                .into_iter()
                .filter(|&child| {
                    !tree.element(child).is_some_and(|elem| {
                        matches!(elem.tag.as_str(), "style" | "link")
                            && elem.classes().any(|class| class == &*self.scoped_class)
                    })
                })
                .collect()
        };
        for child in doomed {
            self.dom.remove_child(self.node, child)?;
        }
        Ok(())
    }

    /// Append markup, a node, or a copy of a template's content
    pub fn append(&self, content: impl Into<Template>) -> Result<()> {
        append_template(&self.dom, self.node, content.into())
    }

    fn resolve(&self, source: EventSource) -> Result<NodeId> {
        match source {
            EventSource::Node(node) => Ok(node),
            EventSource::Selector(selector) => {
                self.dom.query_selector(self.node, &selector)?.ok_or(HtnaError::NoMatch(selector))
            }
        }
    }
}

impl fmt::Debug for DomAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomAccess").field("node", &self.node).finish_non_exhaustive()
    }
}

/// Document that owns nodes created under `node`
pub(crate) fn owner_of(dom: &Dom, node: NodeId) -> Result<NodeId> {
    let tree = dom.tree();
    match tree.get(node) {
        Some(n) if n.is_document() => Ok(node),
        Some(n) => Ok(n.owner),
        None => Err(DomError::NotFound(node).into()),
    }
}

pub(crate) fn append_template(dom: &Dom, parent: NodeId, content: Template) -> Result<()> {
    match content {
        Template::Markup(markup) => {
            let owner = owner_of(dom, parent)?;
            let fragment = htna_html::parse_fragment(dom, owner, &markup)?;
            dom.append_child(parent, fragment)?;
        }
        Template::Node(node) => dom.append_child(parent, node)?,
        Template::Template(template) => {
            let children = dom.tree().child_ids(template);
            for child in children {
                let copy = dom.clone_node(child, true)?;
                dom.append_child(parent, copy)?;
            }
        }
        Template::Empty => {}
    }
    Ok(())
}

/// One-shot wait for an event
///
/// The listener removes itself on the first occurrence. Dropping the waiter
/// without waiting leaves the listener in place until it fires or `cancel`
/// is called.
pub struct EventWaiter {
    dom: Dom,
    node: NodeId,
    listener: ListenerId,
    name: String,
    receiver: Receiver<Event>,
}

impl EventWaiter {
    pub(crate) fn new(dom: Dom, node: NodeId, name: &str) -> Self {
        let (sender, receiver) = channel::bounded(1);
        let listener = dom.add_event_listener_with(
            node,
            name,
            Rc::new(move |event: &mut Event| {
                let _ = sender.try_send(event.clone());
            }),
            ListenerOptions { once: true },
        );
        Self { dom, node, listener, name: name.to_string(), receiver }
    }

    /// Stop listening; a pending `wait` fails with `EventCancelled`
    ///
    /// Returns `false` if the event already fired.
    pub fn cancel(&self) -> bool {
        self.dom.remove_event_listener(self.node, self.listener)
    }

    /// The event, if it already fired
    pub fn try_take(&self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    pub async fn wait(self) -> Result<Event> {
        self.receiver.recv().await.map_err(|_| HtnaError::EventCancelled(self.name.clone()))
    }

    pub async fn wait_timeout(self, timeout: Duration) -> Result<Event> {
        let outcome = smol::future::or(async { Some(self.receiver.recv().await) }, async {
            smol::Timer::after(timeout).await;
            None
        })
        .await;

        match outcome {
            Some(Ok(event)) => Ok(event),
            Some(Err(_)) => Err(HtnaError::EventCancelled(self.name.clone())),
            None => {
                self.cancel();
                tracing::debug!("Timed out waiting for '{}' on {:?}", self.name, self.node);
                Err(HtnaError::EventTimeout(self.name.clone()))
            }
        }
    }
}

impl fmt::Debug for EventWaiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWaiter")
            .field("node", &self.node)
            .field("name", &self.name)
            .field("listener", &self.listener)
            .finish()
    }
}
