//! Prose-to-HTML conversion for scalar content.
//!
//! Scalars are treated as Markdown. A one-line scalar that converts to a single
//! paragraph is rendered inline (`<span>`) so it can sit inside a heading or a
//! list item. Anything with a line break keeps its block-level markup.

use pulldown_cmark::{html, Options, Parser};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Converts Markdown to block-level HTML, without a trailing newline.
pub fn to_block(text: &str) -> String {
    let parser = Parser::new_ext(text, options());
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out.truncate(out.trim_end().len());
    out
}

/// Converts a scalar to HTML, collapsing single-line paragraphs to a span.
pub fn to_markup(text: &str) -> String {
    let block = to_block(text);
    if text.trim().contains('\n') {
        return block;
    }
    match single_paragraph(&block) {
        Some(inner) => format!("<span>{}</span>", inner),
        None => block,
    }
}

/// Returns the inner HTML if `html` is exactly one flat `<p>` element.
fn single_paragraph(html: &str) -> Option<&str> {
    let inner = html.strip_prefix("<p>")?.strip_suffix("</p>")?;
    if inner.contains("<p>") || inner.contains("<p ") || inner.contains("</p>") {
        return None;
    }
    Some(inner)
}

/// Escapes text for safe inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
