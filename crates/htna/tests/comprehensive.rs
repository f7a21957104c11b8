//! Comprehensive tests for htna
//!
//! Component lifecycle through the host DOM: construction, one-time
//! initialization, listeners bound to connection, attribute routing,
//! typed attributes and the access facades.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use htna::{
    AttributeSpec, AttributeType, AttributeValue, ComponentConfig, ControllerArgs, ControllerResult, Dom,
    Event, Htna, HtnaError, NodeId, Options, PropertyDescriptor, ShadowRootMode,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context() -> Htna {
    init_tracing();
    Htna::new(Dom::new(), Options::default())
}

fn connect(htna: &Htna, node: NodeId) {
    let dom = htna.dom();
    dom.append_child(dom.body(), node).unwrap();
}

fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
    let count = Rc::new(Cell::new(0));
    (Rc::clone(&count), count)
}

#[test]
fn test_widget_a_renders_markup() {
    let htna = context();
    htna.define("widget-a", ComponentConfig::new().render(|_| "<b>hi</b>")).unwrap();
    let element = htna.instantiate("widget-a").unwrap();

    let tree = htna.dom().tree();
    let first = tree.first_element_child(element.shadow_root()).unwrap();
    assert_eq!(tree.tag_name(first), Some("b"));
    assert_eq!(tree.text_content(first), "hi");
}

#[test]
fn test_widget_b_counts_ticks() {
    let htna = context();
    let config = ComponentConfig::new()
        .attribute("count", AttributeSpec::typed(AttributeType::Number).observed().value(0))
        .controller(|args: &ControllerArgs| {
            let attributes = args.attributes.clone();
            ControllerResult::new().listener("tick", move |_| {
                let count = attributes.get("count").as_number().unwrap_or(0.0);
                attributes.set("count", count + 1.0).unwrap();
            })
        });
    htna.define("widget-b", config).unwrap();

    let element = htna.instantiate("widget-b").unwrap();
    assert!(!element.attributes().has("count"), "defaults wait for connection");
    connect(&htna, element.node());
    assert_eq!(element.attributes().raw("count").as_deref(), Some("0"));

    for _ in 0..2 {
        htna.dom().dispatch_event(element.node(), &mut Event::new("tick"));
    }
    assert_eq!(element.attributes().raw("count").as_deref(), Some("2"));
    assert_eq!(element.attributes().get("count"), AttributeValue::Number(2.0));
}

#[test]
fn test_initialization_runs_once() {
    let htna = context();
    let (runs, runs_seen) = counter();
    let (connects, connects_seen) = counter();
    let (disconnects, disconnects_seen) = counter();
    let config = ComponentConfig::new().controller(move |_: &ControllerArgs| {
        runs.set(runs.get() + 1);
        let connects = Rc::clone(&connects);
        let disconnects = Rc::clone(&disconnects);
        ControllerResult::new()
            .on_connected(move || connects.set(connects.get() + 1))
            .on_disconnected(move || disconnects.set(disconnects.get() + 1))
    });
    htna.define("x-once", config).unwrap();

    let element = htna.instantiate("x-once").unwrap();
    assert_eq!(runs_seen.get(), 0, "controller deferred until connection");

    connect(&htna, element.node());
    htna.dom().remove(element.node()).unwrap();
    connect(&htna, element.node());

    assert!(element.is_initialized());
    assert_eq!(runs_seen.get(), 1);
    assert_eq!(connects_seen.get(), 2);
    assert_eq!(disconnects_seen.get(), 1);
}

#[test]
fn test_listeners_follow_connection() {
    let htna = context();
    let (hits, hits_seen) = counter();
    let config = ComponentConfig::new().controller(move |_: &ControllerArgs| {
        let hits = Rc::clone(&hits);
        ControllerResult::new().listener("ping", move |_| hits.set(hits.get() + 1))
    });
    htna.define("x-listen", config).unwrap();
    let element = htna.instantiate("x-listen").unwrap();
    let dom = htna.dom().clone();

    connect(&htna, element.node());
    assert_eq!(dom.listener_count(element.node(), "ping"), 1);
    dom.dispatch_event(element.node(), &mut Event::new("ping"));

    dom.remove(element.node()).unwrap();
    assert_eq!(dom.listener_count(element.node(), "ping"), 0);
    dom.dispatch_event(element.node(), &mut Event::new("ping"));

    connect(&htna, element.node());
    assert_eq!(dom.listener_count(element.node(), "ping"), 1);
    dom.dispatch_event(element.node(), &mut Event::new("ping"));

    assert_eq!(hits_seen.get(), 2);
}

#[test]
fn test_defaults_are_presence_gated() {
    let htna = context();
    let config = ComponentConfig::new()
        .attribute("theme", AttributeSpec::new().value("light"))
        .attribute("size", AttributeSpec::typed(AttributeType::Number).value(3))
        .initial("label", "untitled");
    htna.define("x-defaults", config).unwrap();

    let element = htna.instantiate("x-defaults").unwrap();
    htna.dom().set_attribute(element.node(), "theme", "dark").unwrap();
    connect(&htna, element.node());

    let attributes = element.attributes();
    assert_eq!(attributes.raw("theme").as_deref(), Some("dark"));
    assert_eq!(attributes.get("size"), AttributeValue::Number(3.0));
    assert_eq!(attributes.raw("label").as_deref(), Some("untitled"));

    // removed after initialization: not re-applied on reconnect
    attributes.remove("size").unwrap();
    htna.dom().remove(element.node()).unwrap();
    connect(&htna, element.node());
    assert!(!attributes.has("size"));
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let htna = context();
    htna.define("x-twice", ComponentConfig::new().render(|_| "<p>first</p>")).unwrap();
    let err = htna.define("x-twice", ComponentConfig::new().render(|_| "<p>second</p>")).unwrap_err();
    assert!(matches!(err, HtnaError::DuplicateDefinition(tag) if tag == "x-twice"));

    let element = htna.instantiate("x-twice").unwrap();
    assert_eq!(htna_html::inner_html(&htna.dom().tree(), element.shadow_root()), "<p>first</p>");
}

#[test]
fn test_only_observed_attributes_are_routed() {
    let htna = context();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let config = ComponentConfig::new()
        .attribute("size", AttributeSpec::new().observed())
        .attribute("color", AttributeSpec::new())
        .controller(move |_: &ControllerArgs| {
            let sink = Rc::clone(&sink);
            ControllerResult::new().on_attribute_changed(move |name, old, new| {
                sink.borrow_mut().push(format!("{name}:{old:?}->{new:?}"));
            })
        });
    htna.define("x-observe", config).unwrap();

    let element = htna.instantiate("x-observe").unwrap();
    connect(&htna, element.node());
    let dom = htna.dom();
    dom.set_attribute(element.node(), "size", "2").unwrap();
    dom.set_attribute(element.node(), "color", "red").unwrap();
    dom.set_attribute(element.node(), "size", "3").unwrap();
    dom.remove_attribute(element.node(), "size").unwrap();

    assert_eq!(
        *seen.borrow(),
        [
            "size:None->Some(\"2\")",
            "size:Some(\"2\")->Some(\"3\")",
            "size:Some(\"3\")->None",
        ]
    );
}

#[test]
fn test_per_name_attribute_handlers() {
    let htna = context();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let config = ComponentConfig::new()
        .attribute("a", AttributeSpec::new().observed())
        .attribute("b", AttributeSpec::new().observed())
        .controller(move |_: &ControllerArgs| {
            let sink = Rc::clone(&sink);
            ControllerResult::new().on_attribute("a", move |_, _, new| {
                sink.borrow_mut().push(new.unwrap_or_default().to_string());
            })
        });
    htna.define("x-per-name", config).unwrap();

    let element = htna.instantiate("x-per-name").unwrap();
    connect(&htna, element.node());
    element.attributes().set("b", "ignored").unwrap();
    element.attributes().set("a", "kept").unwrap();
    assert_eq!(*seen.borrow(), ["kept"]);
}

#[test]
fn test_property_sugar() {
    let htna = context();
    let config = ComponentConfig::new()
        .attribute("foo-bar", AttributeSpec::typed(AttributeType::Number).property())
        .attribute("is-open", AttributeSpec::typed(AttributeType::Boolean).property());
    htna.define("x-sugar", config).unwrap();

    let element = htna.instantiate("x-sugar").unwrap();
    assert_eq!(element.property_names(), ["fooBar", "isOpen"]);

    element.set_property("fooBar", 5).unwrap();
    assert_eq!(element.attributes().raw("foo-bar").as_deref(), Some("5"));
    htna.dom().set_attribute(element.node(), "foo-bar", "7").unwrap();
    assert_eq!(element.property("fooBar").unwrap(), AttributeValue::Number(7.0));

    element.set_property("isOpen", true).unwrap();
    assert_eq!(element.attributes().raw("is-open").as_deref(), Some("is-open"));
    element.set_property("isOpen", false).unwrap();
    assert!(!element.attributes().has("is-open"));

    assert!(matches!(element.property("foo-bar"), Err(HtnaError::UnknownProperty(_))));
}

#[test]
fn test_controller_properties_override_sugar() {
    let htna = context();
    let config = ComponentConfig::new()
        .attribute("value", AttributeSpec::new().property())
        .controller(|_: &ControllerArgs| {
            ControllerResult::new().property("value", PropertyDescriptor::read_only(|| "fixed".into()))
        });
    htna.define("x-override", config).unwrap();

    let element = htna.instantiate("x-override").unwrap();
    element.set_property("value", "before").unwrap();
    connect(&htna, element.node());

    assert_eq!(element.property("value").unwrap(), "fixed".into());
    assert!(matches!(element.set_property("value", "x"), Err(HtnaError::ReadOnlyProperty(_))));
}

#[test]
fn test_typed_attributes_through_element() {
    let htna = context();
    let config = ComponentConfig::new()
        .attribute("data", AttributeSpec::typed(AttributeType::Json))
        .attribute("when", AttributeSpec::typed(AttributeType::Date))
        .attribute("sizes", AttributeSpec::typed(AttributeType::CsvNumber))
        .attribute("pairs", AttributeSpec::typed(AttributeType::Entries));
    htna.define("x-typed", config).unwrap();
    let element = htna.instantiate("x-typed").unwrap();
    let attributes = element.attributes();

    attributes.set("data", serde_json::json!({"a": [1, 2]})).unwrap();
    assert_eq!(attributes.raw("data").as_deref(), Some(r#"{"a":[1,2]}"#));

    let when = chrono::DateTime::parse_from_rfc3339("2024-05-06T07:08:09.010Z").unwrap().to_utc();
    attributes.set("when", when).unwrap();
    assert_eq!(attributes.raw("when").as_deref(), Some("2024-05-06T07:08:09.010Z"));
    assert_eq!(attributes.get("when"), AttributeValue::Date(when));

    htna.dom().set_attribute(element.node(), "sizes", "1, 2.5,x").unwrap();
    let sizes = attributes.get("sizes");
    let sizes = sizes.as_list().unwrap();
    assert_eq!(sizes[0], AttributeValue::Number(1.0));
    assert_eq!(sizes[1], AttributeValue::Number(2.5));
    assert!(sizes[2].as_number().unwrap().is_nan());

    htna.dom().set_attribute(element.node(), "pairs", "a:1;b").unwrap();
    assert_eq!(
        attributes.get("pairs"),
        AttributeValue::Entries(vec![("a".into(), "1".into()), ("b".into(), String::new())])
    );
}

#[test]
fn test_rich_data_attributes_share_context_store() {
    let htna = context();
    let config = ComponentConfig::new().attribute("model", AttributeSpec::typed(AttributeType::RichData));
    htna.define("x-rich", config).unwrap();
    let element = htna.instantiate("x-rich").unwrap();

    let model = htna::RichValue::new(vec![1u32, 2, 3]);
    element.attributes().set("model", model.clone()).unwrap();
    assert_eq!(htna.rich_data().len(), 1);
    let stored = element.attributes().get("model");
    assert_eq!(stored.as_rich().unwrap().downcast_ref::<Vec<u32>>(), Some(&vec![1, 2, 3]));

    element.attributes().set("model", AttributeValue::Null).unwrap();
    assert!(htna.rich_data().is_empty());
}

#[test]
fn test_cloned_element_gets_its_own_rich_data() {
    let htna = context();
    let config = ComponentConfig::new().attribute("model", AttributeSpec::typed(AttributeType::RichData));
    htna.define("x-rich-copy", config).unwrap();
    let original = htna.instantiate("x-rich-copy").unwrap();
    original.attributes().set("model", 1).unwrap();

    let copy_node = htna.dom().clone_node(original.node(), false).unwrap();
    let copy = htna.element(copy_node).unwrap();
    assert_eq!(copy.attributes().raw("model"), original.attributes().raw("model"));

    copy.attributes().set("model", 2).unwrap();
    assert_ne!(copy.attributes().raw("model"), original.attributes().raw("model"));
    assert_eq!(original.attributes().get("model"), AttributeValue::Number(1.0));
    assert_eq!(copy.attributes().get("model"), AttributeValue::Number(2.0));

    copy.attributes().remove("model").unwrap();
    assert_eq!(original.attributes().get("model"), AttributeValue::Number(1.0));
    assert_eq!(htna.rich_data().len(), 1);
}

#[test]
fn test_markup_creates_components() {
    let htna = context();
    let (connects, connects_seen) = counter();
    let config = ComponentConfig::new()
        .attribute("label", AttributeSpec::new().observed())
        .render(|args: &ControllerArgs| format!("<span>{}</span>", args.attributes.raw("label").unwrap_or_default()))
        .controller(move |_: &ControllerArgs| {
            let connects = Rc::clone(&connects);
            ControllerResult::new().on_connected(move || connects.set(connects.get() + 1))
        });
    htna.define("x-tag", config).unwrap();

    let dom = htna.dom();
    htna_html::set_inner_html(dom, dom.body(), r#"<x-tag label="one"></x-tag><x-tag></x-tag>"#).unwrap();
    let nodes = dom.query_selector_all(dom.body(), "x-tag").unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(connects_seen.get(), 2);
    assert!(htna.element(nodes[0]).is_some());
    assert!(htna.element(dom.body()).is_none());
}

#[test]
fn test_define_upgrades_existing_elements() {
    let htna = context();
    let dom = htna.dom();
    let early = dom.create_element("x-late").unwrap();
    connect(&htna, early);
    assert!(htna.element(early).is_none());

    htna.define("x-late", ComponentConfig::new().render(|_| "<i>late</i>")).unwrap();
    let element = htna.element(early).unwrap();
    assert!(element.is_initialized());
    assert_eq!(htna_html::inner_html(&dom.tree(), element.shadow_root()), "<i>late</i>");
}

#[test]
fn test_adopted_callback() {
    let htna = context();
    let (adoptions, adoptions_seen) = counter();
    let config = ComponentConfig::new().controller(move |_: &ControllerArgs| {
        let adoptions = Rc::clone(&adoptions);
        ControllerResult::new().on_adopted(move || adoptions.set(adoptions.get() + 1))
    });
    htna.define("x-adopt", config).unwrap();

    let element = htna.instantiate("x-adopt").unwrap();
    connect(&htna, element.node());
    let other = htna.dom().create_document();
    htna.dom().adopt_node(other, element.node()).unwrap();
    assert_eq!(adoptions_seen.get(), 1);

    // the controller supplies adopted_callback, so nothing runs before the first connection
    let detached = htna.instantiate("x-adopt").unwrap();
    htna.dom().adopt_node(other, detached.node()).unwrap();
    assert_eq!(adoptions_seen.get(), 1);
    assert!(!detached.is_initialized());
    assert_eq!(htna.dom().tree().owner_document(detached.node()), Some(other));
}

#[test]
fn test_shadow_mode_from_options_and_config() {
    init_tracing();
    let options = Options::from_json(r#"{"default_mode": "open"}"#).unwrap();
    let htna = Htna::new(Dom::new(), options);
    htna.define("x-open", ComponentConfig::new()).unwrap();
    htna.define("x-sealed", ComponentConfig::new().mode(ShadowRootMode::Closed)).unwrap();

    let open = htna.instantiate("x-open").unwrap();
    let sealed = htna.instantiate("x-sealed").unwrap();
    assert_eq!(htna.dom().shadow_root(open.node()), Some(open.shadow_root()));
    assert_eq!(htna.dom().shadow_root(sealed.node()), None);
}

#[test]
fn test_shadow_delegate_and_style() {
    let htna = context();
    let (presses, presses_seen) = counter();
    let config = ComponentConfig::new()
        .render(|_| r#"<button class="go">go</button><button>stop</button>"#)
        .style(":host { display: block }")
        .controller(move |args: &ControllerArgs| {
            let presses = Rc::clone(&presses);
            args.shadow
                .delegate(args.shadow.node(), "press", "button.go", move |_| presses.set(presses.get() + 1))
                .unwrap();
            None::<ControllerResult>
        });
    htna.define("x-buttons", config).unwrap();
    let element = htna.instantiate("x-buttons").unwrap();
    connect(&htna, element.node());

    for button in element.shadow().query_all("button") {
        htna.dom().dispatch_event(button, &mut Event::new("press").with_bubbles(true));
    }
    assert_eq!(presses_seen.get(), 1);

    element.shadow().empty().unwrap();
    let remaining = htna.dom().tree().child_ids(element.shadow_root());
    assert_eq!(remaining.len(), 1, "scoped style survives empty()");
}

#[test]
fn test_slots_on_light_tree() {
    let htna = context();
    htna.define("x-card", ComponentConfig::new()).unwrap();
    let element = htna.instantiate("x-card").unwrap();

    let title = element.slot().append("title", "Hello").unwrap();
    element.slot().replace("title", 42).unwrap();
    assert_eq!(element.slot().get("title").map(|n| htna.dom().text_content(n)), Some("42".to_string()));
    assert_eq!(htna.dom().tree().parent(title), None);
    assert_eq!(
        htna_html::inner_html(&htna.dom().tree(), element.node()),
        r#"<div slot="title">42</div>"#
    );
}

#[test]
fn test_event_waiter_on_light_tree() {
    let htna = context();
    htna.define("x-wait", ComponentConfig::new()).unwrap();
    let element = htna.instantiate("x-wait").unwrap();
    connect(&htna, element.node());

    let waiter = element.light().when("loaded");
    let light = element.light().clone();
    let event = smol::block_on(async move {
        light.dispatch("loaded", Some(Rc::new("payload")), true);
        waiter.wait_timeout(Duration::from_secs(1)).await
    })
    .unwrap();
    assert_eq!(event.detail::<&str>(), Some(&"payload"));
    assert!(event.composed && event.cancelable);

    let late = element.light().when("never");
    let err = smol::block_on(late.wait_timeout(Duration::from_millis(5))).unwrap_err();
    assert!(matches!(err, HtnaError::EventTimeout(_)));
}

#[test]
fn test_form_input_mirrors_host_attributes() {
    let htna = context();
    let config = ComponentConfig::new()
        .attribute("value", AttributeSpec::new().value("initial"))
        .form_input(htna::FormInputType::Text);
    htna.define("x-field", config).unwrap();
    let element = htna.instantiate("x-field").unwrap();
    let dom = htna.dom();
    dom.set_attribute(element.node(), "name", "title").unwrap();
    assert_eq!(dom.query_selector(element.node(), "input.htna-form-input").unwrap(), None);

    connect(&htna, element.node());
    let input = dom.query_selector(element.node(), "input.htna-form-input").unwrap().unwrap();
    assert_eq!(dom.get_attribute(input, "type").as_deref(), Some("hidden"));
    assert_eq!(dom.get_attribute(input, "name").as_deref(), Some("title"));
    assert_eq!(dom.get_attribute(input, "value").as_deref(), Some("initial"));

    element.attributes().set("value", "edited").unwrap();
    assert_eq!(dom.get_attribute(input, "value").as_deref(), Some("edited"));

    dom.set_attribute(input, "value", "typed").unwrap();
    dom.dispatch_event(input, &mut Event::new("change"));
    assert_eq!(element.attributes().raw("value").as_deref(), Some("typed"));
}

#[test]
fn test_checkbox_form_input_tracks_checked() {
    let htna = context();
    let (changes, changes_seen) = counter();
    let config = ComponentConfig::new()
        .form_input(htna::FormInputType::Checkbox)
        .controller(move |_: &ControllerArgs| {
            let changes = Rc::clone(&changes);
            ControllerResult::new().on_attribute("checked", move |_, _, _| changes.set(changes.get() + 1))
        });
    htna.define("x-check", config).unwrap();
    let element = htna.instantiate("x-check").unwrap();
    connect(&htna, element.node());

    let dom = htna.dom();
    let input = dom.query_selector(element.node(), "input.htna-form-input").unwrap().unwrap();
    assert_eq!(dom.get_attribute(input, "type").as_deref(), Some("checkbox"));
    assert!(!dom.has_attribute(input, "checked"));

    dom.set_attribute(element.node(), "checked", "").unwrap();
    assert!(!dom.has_attribute(input, "checked"), "empty string is not checked");
    dom.set_attribute(element.node(), "checked", "checked").unwrap();
    assert!(dom.has_attribute(input, "checked"));

    dom.remove_attribute(input, "checked").unwrap();
    dom.dispatch_event(input, &mut Event::new("change"));
    assert!(!element.attributes().has("checked"));
    assert_eq!(changes_seen.get(), 3);
}
