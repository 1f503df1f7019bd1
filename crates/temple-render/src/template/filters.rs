//! Helper filters available to every template.
//!
//! | Filter | Effect |
//! |--------|--------|
//! | `markdown` | Markdown to block HTML |
//! | `inline` | Markdown to HTML, single lines collapsed to a `<span>` |
//! | `slugify` | ASCII, lowercase, dash-separated identifier |
//!
//! minijinja's builtin filters and tests stay available alongside these.

use minijinja::{Environment, Value};

use crate::markup;

/// Registers the helper filters with a minijinja environment.
pub fn register_helpers(env: &mut Environment<'static>) {
    env.add_filter("markdown", |value: String| -> Value {
        Value::from_safe_string(markup::to_block(&value))
    });

    env.add_filter("inline", |value: String| -> Value {
        Value::from_safe_string(markup::to_markup(&value))
    });

    env.add_filter("slugify", slugify);
}

/// Turns arbitrary text into a URL-friendly slug.
pub fn slugify(value: String) -> String {
    let ascii = deunicode::deunicode(&value).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}
