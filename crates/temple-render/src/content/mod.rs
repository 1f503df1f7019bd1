//! Content model and loading.
//!
//! - [`Node`]: the closed set of content node variants
//! - [`ContentLoader`]: parses documents and resolves includes and globals
//! - [`ContentSet`]: the immutable result handed to the renderer

mod loader;
mod node;

pub use loader::{parse_document, ContentLoader, ContentSet, Globals, LoadError};
pub use node::{
    is_directive, scalar_text, Node, ObjectNode, TemplateNode, GLOBALS_KEY, INCLUDE_KEY,
    OBJECT_KEY, PATH_KEY, REF_KEY, TEMPLATE_KEY,
};
