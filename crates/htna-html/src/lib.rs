//! HTNA HTML
//!
//! Markup fragments parsed with html5ever into the host DOM, and
//! innerHTML/outerHTML serialization back out of it.

mod parser;
mod serializer;

pub use parser::{parse_fragment, set_inner_html, HtmlParser};
pub use serializer::{inner_html, outer_html, HtmlSerializer};
