//! Template compilation and lookup.
//!
//! Templates are minijinja templates with ERB-style delimiters (`<%= %>`,
//! `<% %>`, `<%# %>`), registered under a name derived from their file path.
//!
//! ## Key Types
//!
//! - [`TemplateRegistry`]: compiled templates, resolved by name
//! - [`template_name`]: the path → name rule
//! - [`walk_template_dir`]: template discovery on disk
//!
//! The helper filters installed on every registry live in [`filters`].

pub mod filters;
pub mod registry;

pub use registry::{template_name, walk_template_dir, RegistryError, TemplateFile, TemplateRegistry};
