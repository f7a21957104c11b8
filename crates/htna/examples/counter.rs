//! Example: a counter component driven by events

use htna::{
    AttributeSpec, AttributeType, ComponentConfig, ControllerArgs, ControllerResult, Dom, Event, Htna, Options,
};

fn main() -> htna::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let htna = Htna::new(Dom::new(), Options::default());
    let config = ComponentConfig::new()
        .attribute("count", AttributeSpec::typed(AttributeType::Number).observed().value(0))
        .render(|_| "<span>count: <slot></slot></span>")
        .style("span { font-weight: bold }")
        .controller(|args: &ControllerArgs| {
            let attributes = args.attributes.clone();
            let light = args.light.clone();
            ControllerResult::new()
                .listener("tick", move |_| {
                    let count = attributes.get("count").as_number().unwrap_or(0.0);
                    if let Err(err) = attributes.set("count", count + 1.0) {
                        tracing::warn!("tick not recorded: {}", err);
                    }
                })
                .on_attribute("count", move |_, _, new| {
                    light.dispatch("count-changed", None, true);
                    println!("count is now {}", new.unwrap_or("unset"));
                })
        });
    htna.define("x-counter", config)?;

    let counter = htna.instantiate("x-counter")?;
    let dom = htna.dom();
    dom.append_child(dom.body(), counter.node())?;

    for _ in 0..3 {
        dom.dispatch_event(counter.node(), &mut Event::new("tick"));
    }
    println!("final value: {}", counter.attributes().get("count"));
    println!("{}", htna_html::outer_html(&dom.tree(), dom.body()));
    Ok(())
}
