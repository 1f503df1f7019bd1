//! # Temple Render - Recursive Content Rendering
//!
//! `temple-render` turns a tree of structured content (YAML or JSON) into
//! documents by expanding named templates, recursively.
//!
//! Content is a list of nodes. Strings become Markdown-rendered HTML, lists
//! render each item in turn, and mappings with a `$t` key are expanded
//! through the template of that name. Templates can call `render(...)` on any
//! nested value, so a page template renders its sections, which render their
//! items, and so on. A node with `$path` is written out as its own file.
//!
//! ## Core Concepts
//!
//! - [`ContentLoader`]: parses content, follows `$include` and collects `$globals`
//! - [`Node`]: the classified content tree
//! - [`TemplateRegistry`]: named templates with `<%= %>` delimiters
//! - [`Renderer`]: the recursion engine with a per-node error boundary
//! - [`OutputSink`]: where `$path` documents go ([`FileSink`], [`StreamSink`])
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use temple_render::{ContentLoader, Renderer, StreamSink, TemplateRegistry};
//!
//! let mut templates = TemplateRegistry::new().unwrap();
//! templates.register("page", "<h1><%= title %></h1>\n<%= render(body) %>").unwrap();
//!
//! let content = ContentLoader::new()
//!     .load_str("- $t: page\n  $path: index.html\n  title: Hi\n  body: [hello]\n", ".")
//!     .unwrap();
//!
//! let sink = Arc::new(StreamSink::new());
//! let renderer = Renderer::new(Arc::new(templates), Arc::new(content), sink.clone());
//! let outcome = renderer.render_content();
//!
//! assert!(outcome.is_success());
//! assert_eq!(sink.files()[0].contents, "<h1>Hi</h1>\n<span>hello</span>");
//! ```
//!
//! ## Errors
//!
//! Loading and template compilation fail fast with [`LoadError`] and
//! [`RegistryError`]. Once rendering starts, a failing node never stops the
//! run: it becomes an inline error marker and a [`RenderFailure`].

pub mod content;
mod error;
pub mod markup;
pub mod output;
pub mod renderer;
pub mod template;
mod util;

pub use error::RenderError;

pub use content::{ContentLoader, ContentSet, Globals, LoadError, Node, TemplateNode};

pub use output::{relative_output_path, FileSink, OutputSink, SinkError, StreamSink, VirtualFile};

pub use renderer::{error_marker, RenderFailure, RenderOutcome, Renderer, MAX_DEPTH, RENDER_FN};

pub use template::{template_name, walk_template_dir, RegistryError, TemplateFile, TemplateRegistry};
