//! Markdown rendering for chat bubbles
//!
//! Model replies routinely use emphasis and lists. Raw HTML in the source is
//! shown as text, never passed through.

use pulldown_cmark::{html, Event, Options, Parser};

/// Render turn content to an HTML fragment
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let events = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}
