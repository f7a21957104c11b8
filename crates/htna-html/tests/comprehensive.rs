//! Comprehensive tests for htna-html
//!
//! Parsing into a live `Dom`, serialization, and custom element upgrades
//! triggered by parsed markup.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use htna_dom::{CustomElementReactions, Dom, DomResult, NodeId, ShadowRootMode};
use htna_html::{inner_html, outer_html, parse_fragment, set_inner_html};

#[test]
fn test_set_inner_html_round_trip() {
    let dom = Dom::new();
    let div = dom.create_element("div").unwrap();
    set_inner_html(&dom, div, r#"<p class="x">a &amp; b</p><br><!--note-->"#).unwrap();

    let tree = dom.tree();
    assert_eq!(inner_html(&tree, div), r#"<p class="x">a &amp; b</p><br><!--note-->"#);
    assert_eq!(outer_html(&tree, div), r#"<div><p class="x">a &amp; b</p><br><!--note--></div>"#);
}

#[test]
fn test_set_inner_html_replaces_children() {
    let dom = Dom::new();
    let div = dom.create_element("div").unwrap();
    set_inner_html(&dom, div, "<i>one</i>").unwrap();
    set_inner_html(&dom, div, "<i>two</i>").unwrap();

    assert_eq!(inner_html(&dom.tree(), div), "<i>two</i>");
}

#[test]
fn test_parse_into_shadow_root() {
    let dom = Dom::new();
    let host = dom.create_element("x-card").unwrap();
    let shadow = dom.attach_shadow(host, ShadowRootMode::Closed).unwrap();
    set_inner_html(&dom, shadow, "<slot name=\"title\"></slot>").unwrap();

    let tree = dom.tree();
    assert_eq!(inner_html(&tree, shadow), r#"<slot name="title"></slot>"#);
    // shadow content is not part of the host's markup
    assert_eq!(outer_html(&tree, host), "<x-card></x-card>");
}

struct Counter(Rc<Cell<u32>>);

impl CustomElementReactions for Counter {
    fn connected(&self, _dom: &Dom, _element: NodeId) {
        self.0.set(self.0.get() + 1);
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[test]
fn test_parsed_custom_elements_are_upgraded() {
    let dom = Dom::new();
    let connects = Rc::new(Cell::new(0));
    let sink = Rc::clone(&connects);
    dom.define(
        "x-leaf",
        Rc::new(move |_: &Dom, _: NodeId| -> DomResult<Rc<dyn CustomElementReactions>> {
            Ok(Rc::new(Counter(Rc::clone(&sink))))
        }),
        Default::default(),
    )
    .unwrap();

    let fragment = parse_fragment(&dom, dom.document(), "<x-leaf></x-leaf><div><x-leaf></x-leaf></div>").unwrap();
    let leaves = dom.query_selector_all(fragment, "x-leaf").unwrap();
    assert_eq!(leaves.len(), 2);
    assert!(leaves.iter().all(|&leaf| dom.reactions(leaf).is_some()));
    assert_eq!(connects.get(), 0);

    dom.append_child(dom.body(), fragment).unwrap();
    assert_eq!(connects.get(), 2);
}
