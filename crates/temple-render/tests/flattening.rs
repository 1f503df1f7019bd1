//! Property tests for sequence rendering.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::Value;
use temple_render::{ContentSet, Node, Renderer, StreamSink, TemplateRegistry};

fn renderer() -> Arc<Renderer> {
    Renderer::new(
        Arc::new(TemplateRegistry::new().unwrap()),
        Arc::new(ContentSet::default()),
        Arc::new(StreamSink::new()),
    )
}

// Nested arrays of single-line words, up to 4 levels deep.
fn nested_strategy() -> impl Strategy<Value = Value> {
    let leaf = "[a-z]{1,8}( [a-z]{1,8}){0,2}".prop_map(Value::String);
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Value::Array)
    })
}

fn flatten(value: &Value, leaves: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| flatten(item, leaves)),
        other => leaves.push(other.clone()),
    }
}

proptest! {
    #[test]
    fn nested_sequences_render_like_flat_ones(value in nested_strategy()) {
        let mut leaves = Vec::new();
        flatten(&value, &mut leaves);

        let renderer = renderer();
        let nested = renderer.render(&Node::from_value(&value));
        let flat = renderer.render(&Node::from_value(&Value::Array(leaves)));

        prop_assert_eq!(nested, flat);
        prop_assert_eq!(renderer.failure_count(), 0);
    }

    #[test]
    fn deep_wrapping_renders_like_the_leaf(depth in 0usize..200, text in "[a-z]{1,8}") {
        let mut value = Value::String(text.clone());
        for _ in 0..depth {
            value = Value::Array(vec![value]);
        }

        let renderer = renderer();
        let output = renderer.render(&Node::from_value(&value));

        prop_assert_eq!(output, format!("<span>{}</span>", text));
        prop_assert_eq!(renderer.failure_count(), 0);
    }

    #[test]
    fn single_line_scalars_render_inline(text in "[a-z]{1,8}( [a-z]{1,8}){0,4}") {
        let output = renderer().render(&Node::Scalar(text.clone()));
        prop_assert_eq!(output, format!("<span>{}</span>", text));
    }

    #[test]
    fn multi_paragraph_scalars_keep_blocks(
        first in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
        second in "[a-z]{1,8}( [a-z]{1,8}){0,3}",
    ) {
        let output = renderer().render(&Node::Scalar(format!("{first}\n\n{second}")));
        prop_assert_eq!(output, format!("<p>{}</p>\n<p>{}</p>", first, second));
    }
}
