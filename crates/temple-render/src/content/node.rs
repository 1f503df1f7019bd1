//! The content node model.
//!
//! Raw content arrives as [`serde_json::Value`] trees (YAML documents are
//! deserialized straight into them). [`Node::from_value`] classifies a value
//! exactly once into the closed [`Node`] enum, so the renderer dispatches on a
//! variant instead of re-inspecting mapping keys at every step.
//!
//! # Directive Keys
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `$t` | Template name used to render the mapping |
//! | `$path` | Output path, relative to the output root |
//! | `$ref` | Replace this node with the named global |
//! | `$include` | Splice in another content document |
//! | `$object` | Declaration-only node, never rendered |
//! | `$globals` | Name → node mapping registered at load time |
//!
//! When several directives appear on the same mapping, the first match in the
//! order `$include`, `$ref`, `$globals`, `$object` decides the variant.

use serde_json::{Map, Value};

pub const TEMPLATE_KEY: &str = "$t";
pub const PATH_KEY: &str = "$path";
pub const REF_KEY: &str = "$ref";
pub const INCLUDE_KEY: &str = "$include";
pub const OBJECT_KEY: &str = "$object";
pub const GLOBALS_KEY: &str = "$globals";

/// One unit of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `null` or an absent value. Renders as an empty sequence.
    Empty,
    /// Any string, number or boolean, already coerced to text.
    Scalar(String),
    /// An ordered list of nodes whose outputs are joined with newlines.
    Sequence(Vec<Node>),
    /// A mapping rendered through a named template.
    Template(TemplateNode),
    /// A `$ref` to a registered global.
    Reference(String),
    /// An `$include` of another content document.
    Include(String),
    /// A `$globals` declaration. Its entries were registered during loading.
    GlobalsDecl,
    /// An `$object` declaration.
    ObjectOnly(ObjectNode),
}

/// A mapping that is rendered through a template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateNode {
    /// Value of `$t`. `None` when absent or not a scalar.
    pub template: Option<String>,
    /// Value of `$path`.
    pub output_path: Option<String>,
    /// Every key that is not a directive, in document order.
    pub fields: Map<String, Value>,
}

/// A declaration-only mapping (`$object`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    /// A `$t` found next to `$object`. Its presence is a render error.
    pub template: Option<String>,
}

impl Node {
    /// Classifies a raw value.
    pub fn from_value(value: &Value) -> Node {
        match value {
            Value::Null => Node::Empty,
            Value::Array(items) => Node::Sequence(items.iter().map(Node::from_value).collect()),
            Value::Object(map) => Node::from_map(map),
            scalar => Node::Scalar(scalar_text(scalar).unwrap_or_default()),
        }
    }

    /// Classifies a list of top-level document values into a sequence.
    pub fn from_values(values: &[Value]) -> Node {
        Node::Sequence(values.iter().map(Node::from_value).collect())
    }

    fn from_map(map: &Map<String, Value>) -> Node {
        if let Some(target) = map.get(INCLUDE_KEY) {
            return Node::Include(scalar_text(target).unwrap_or_default());
        }
        if let Some(name) = map.get(REF_KEY) {
            return Node::Reference(scalar_text(name).unwrap_or_default());
        }
        if map.contains_key(GLOBALS_KEY) {
            return Node::GlobalsDecl;
        }

        let template = map.get(TEMPLATE_KEY).and_then(scalar_text);
        if map.contains_key(OBJECT_KEY) {
            return Node::ObjectOnly(ObjectNode { template });
        }

        let fields = map
            .iter()
            .filter(|(key, _)| !is_directive(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Node::Template(TemplateNode {
            template,
            output_path: map.get(PATH_KEY).and_then(scalar_text),
            fields,
        })
    }

    /// Short human-readable description, used in failure records and logs.
    pub fn summary(&self) -> String {
        match self {
            Node::Empty => "empty node".to_string(),
            Node::Scalar(text) => {
                let mut preview: String = text.chars().take(40).collect();
                if preview.len() < text.len() {
                    preview.push_str("...");
                }
                format!("scalar {:?}", preview)
            }
            Node::Sequence(items) => format!("sequence of {} nodes", items.len()),
            Node::Template(node) => {
                let name = node.template.as_deref().unwrap_or("<none>");
                match &node.output_path {
                    Some(path) => format!("template \"{}\" -> {}", name, path),
                    None => format!("template \"{}\"", name),
                }
            }
            Node::Reference(name) => format!("$ref \"{}\"", name),
            Node::Include(path) => format!("$include \"{}\"", path),
            Node::GlobalsDecl => "$globals declaration".to_string(),
            Node::ObjectOnly(_) => "$object declaration".to_string(),
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        Node::from_value(value)
    }
}

/// Returns true for reserved keys, which never reach a template context.
pub fn is_directive(key: &str) -> bool {
    key.starts_with('$')
}

/// Coerces strings, numbers and booleans to text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
