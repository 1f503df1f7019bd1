//! The recursive renderer.
//!
//! [`Renderer`] walks content nodes and turns each one into text:
//!
//! | Node | Result |
//! |------|--------|
//! | `Empty` | empty string |
//! | `Scalar` | Markdown → HTML, single lines as `<span>` |
//! | `Sequence` | children rendered in order, joined with `\n` |
//! | `Include` | the included document, rendered as a sequence |
//! | `Reference` | the global it names, dispatched as if inlined |
//! | `GlobalsDecl` | empty string |
//! | `ObjectOnly` | empty string, or an error if it also has `$t` |
//! | `Template` | the named template expanded with the node's fields |
//!
//! Empty results are dropped from a sequence before joining, so nesting never
//! changes the output: `[[a, b], [], c]` renders exactly like `[a, b, c]`.
//!
//! # Error Boundary
//!
//! Every node is rendered behind its own boundary. A failing node is logged,
//! recorded as a [`RenderFailure`] and replaced by an inline error marker;
//! its siblings render normally. Collect the failures with
//! [`Renderer::take_failures`] or use [`Renderer::render_all`].
//!
//! # Nested Rendering
//!
//! Each template sees its node's fields plus a `render` function. Calling
//! `render(value)` from a template runs the renderer on any nested value
//! (a field holding a list of nodes, a scalar, a `$ref` mapping...) and
//! returns the HTML, so pages can embed sub-content:
//!
//! ```text
//! <article><h1><%= title %></h1><%= render(body) %></article>
//! ```
//!
//! Nodes with `$path` hand their text to the [`OutputSink`] and contribute
//! nothing to their parent.
//!
//! # Cycles
//!
//! The renderer tracks the `$ref` names and `$include` paths currently being
//! resolved. Reaching one that is already open fails that node with
//! [`RenderError::Cycle`]. Plain nesting is only bounded by [`MAX_DEPTH`].

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use minijinja::{Error as JinjaError, ErrorKind, Value};
use tracing::{debug, trace, warn};

use crate::content::{ContentSet, Node, TemplateNode};
use crate::error::RenderError;
use crate::markup::{self, escape_html};
use crate::output::OutputSink;
use crate::template::TemplateRegistry;
use crate::util::lock;

/// Maximum structural nesting of node renders before a node fails with
/// [`RenderError::DepthExceeded`].
pub const MAX_DEPTH: usize = 256;

/// Name of the nested-render function in every template context.
pub const RENDER_FN: &str = "render";

/// CSS class of the inline error marker.
pub const ERROR_CLASS: &str = "temple-error";

/// A recorded node failure.
#[derive(Debug)]
pub struct RenderFailure {
    /// What went wrong
    pub error: RenderError,
    /// Short description of the node that failed
    pub node_summary: String,
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node_summary, self.error)
    }
}

/// Result of rendering a list of nodes.
#[derive(Debug, Default)]
pub struct RenderOutcome {
    /// Joined text of all nodes that did not go to the sink
    pub output: String,
    /// Every node failure, in the order they happened
    pub failures: Vec<RenderFailure>,
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renders an error as an inline HTML marker.
pub fn error_marker(error: &RenderError) -> String {
    format!(
        "<span class=\"{}\">{}</span>",
        ERROR_CLASS,
        escape_html(&error.to_string())
    )
}

/// Recursive content renderer.
///
/// Created behind an [`Arc`] because templates hold a handle back to the
/// renderer for nested rendering.
pub struct Renderer {
    templates: Arc<TemplateRegistry>,
    content: Arc<ContentSet>,
    sink: Arc<dyn OutputSink>,
    failures: Mutex<Vec<RenderFailure>>,
    depth: AtomicUsize,
    resolving: Mutex<Vec<String>>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("templates", &self.templates.len())
            .field("globals", &self.content.globals().len())
            .field("failures", &lock(&self.failures).len())
            .finish()
    }
}

impl Renderer {
    pub fn new(
        templates: Arc<TemplateRegistry>,
        content: Arc<ContentSet>,
        sink: Arc<dyn OutputSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            templates,
            content,
            sink,
            failures: Mutex::new(Vec::new()),
            depth: AtomicUsize::new(0),
            resolving: Mutex::new(Vec::new()),
        })
    }

    /// Renders the root document of the content set.
    pub fn render_content(self: &Arc<Self>) -> RenderOutcome {
        let content = Arc::clone(&self.content);
        self.render_all(content.root())
    }

    /// Renders a list of nodes and drains the failures they produced.
    pub fn render_all(self: &Arc<Self>, nodes: &[Node]) -> RenderOutcome {
        let output = self.render_sequence(nodes);
        RenderOutcome {
            output,
            failures: self.take_failures(),
        }
    }

    /// Renders one node behind its error boundary.
    pub fn render(self: &Arc<Self>, node: &Node) -> String {
        match self.try_render(node) {
            Ok(text) => text,
            Err(error) => self.fail(node, error),
        }
    }

    /// Drains the failures recorded so far.
    pub fn take_failures(&self) -> Vec<RenderFailure> {
        std::mem::take(&mut *lock(&self.failures))
    }

    /// Number of failures recorded and not yet taken.
    pub fn failure_count(&self) -> usize {
        lock(&self.failures).len()
    }

    fn fail(&self, node: &Node, error: RenderError) -> String {
        let summary = node.summary();
        warn!(node = %summary, error = %error, "node failed to render");
        let marker = error_marker(&error);
        lock(&self.failures).push(RenderFailure {
            error,
            node_summary: summary,
        });
        marker
    }

    fn try_render(self: &Arc<Self>, node: &Node) -> Result<String, RenderError> {
        let _depth = DepthGuard::enter(&self.depth)?;
        trace!(node = %node.summary(), "rendering");

        match node {
            Node::Empty | Node::GlobalsDecl => Ok(String::new()),
            Node::Scalar(text) => Ok(markup::to_markup(text)),
            Node::Sequence(items) => Ok(self.render_sequence(items)),
            Node::Include(path) => {
                let _open = ResolveGuard::enter(&self.resolving, node.summary())?;
                let content = Arc::clone(&self.content);
                let document = content
                    .document(path)
                    .ok_or_else(|| RenderError::IncludeNotLoaded { path: path.clone() })?;
                Ok(self.render_sequence(document))
            }
            Node::Reference(name) => {
                let _open = ResolveGuard::enter(&self.resolving, node.summary())?;
                let content = Arc::clone(&self.content);
                let target = content
                    .globals()
                    .get(name)
                    .ok_or_else(|| RenderError::UnknownGlobal { name: name.clone() })?;
                self.try_render(target)
            }
            Node::ObjectOnly(object) => match &object.template {
                Some(name) => Err(RenderError::ObjectWithTemplate { name: name.clone() }),
                None => Ok(String::new()),
            },
            Node::Template(template) => self.render_template(template),
        }
    }

    fn render_sequence(self: &Arc<Self>, items: &[Node]) -> String {
        items
            .iter()
            .map(|item| self.render(item))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_template(self: &Arc<Self>, node: &TemplateNode) -> Result<String, RenderError> {
        let name = node
            .template
            .as_deref()
            .ok_or(RenderError::MissingTemplateName)?;
        let template = self
            .templates
            .resolve(name)
            .ok_or_else(|| RenderError::TemplateNotFound {
                name: name.to_string(),
            })?;

        let context = self.context_for(node);
        let text = template
            .render(&context)
            .map_err(|e| RenderError::template(name, e))?;

        match &node.output_path {
            Some(path) => {
                self.sink.emit(path, &text)?;
                debug!(template = %name, path = %path, "emitted output file");
                Ok(String::new())
            }
            None => Ok(text),
        }
    }

    fn context_for(self: &Arc<Self>, node: &TemplateNode) -> HashMap<String, Value> {
        let mut context: HashMap<String, Value> = node
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
            .collect();
        context.insert(RENDER_FN.to_string(), self.nested_render());
        context
    }

    /// The `render` function handed to templates.
    fn nested_render(self: &Arc<Self>) -> Value {
        let renderer = Arc::clone(self);
        Value::from_function(move |content: Value| -> Result<Value, JinjaError> {
            let raw = serde_json::to_value(&content).map_err(|e| {
                JinjaError::new(
                    ErrorKind::BadSerialization,
                    format!("cannot render value: {}", e),
                )
            })?;
            let html = renderer.render(&Node::from_value(&raw));
            Ok(Value::from_safe_string(html))
        })
    }
}

/// Tracks render nesting, released on drop.
struct DepthGuard<'a>(&'a AtomicUsize);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a AtomicUsize) -> Result<Self, RenderError> {
        let current = depth.fetch_add(1, Ordering::SeqCst) + 1;
        if current > MAX_DEPTH {
            depth.fetch_sub(1, Ordering::SeqCst);
            return Err(RenderError::DepthExceeded { limit: MAX_DEPTH });
        }
        Ok(Self(depth))
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks a `$ref` or `$include` as open, released on drop.
struct ResolveGuard<'a>(&'a Mutex<Vec<String>>);

impl<'a> ResolveGuard<'a> {
    fn enter(open: &'a Mutex<Vec<String>>, key: String) -> Result<Self, RenderError> {
        let mut stack = lock(open);
        if let Some(start) = stack.iter().position(|entry| *entry == key) {
            let mut chain = stack[start..].to_vec();
            chain.push(key);
            return Err(RenderError::Cycle {
                chain: chain.join(" -> "),
            });
        }
        stack.push(key);
        Ok(Self(open))
    }
}

impl Drop for ResolveGuard<'_> {
    fn drop(&mut self) {
        lock(self.0).pop();
    }
}
