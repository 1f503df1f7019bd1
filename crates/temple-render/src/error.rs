//! Node-level render errors.
//!
//! A [`RenderError`] never aborts a run. The renderer records it, substitutes
//! an inline error marker for the failing node and carries on with the
//! siblings. Fatal problems (unreadable content, bad templates) are reported
//! through [`LoadError`](crate::content::LoadError) and
//! [`RegistryError`](crate::template::RegistryError) before rendering starts.

use crate::output::SinkError;

/// Error raised while rendering a single node.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A template node without `$t`.
    #[error("node has no template name ($t)")]
    MissingTemplateName,

    /// `$t` names a template that was never registered.
    #[error("template not found: \"{name}\"")]
    TemplateNotFound { name: String },

    /// `$object` and `$t` on the same node.
    #[error("$object and template name \"{name}\" are mutually exclusive")]
    ObjectWithTemplate { name: String },

    /// `$ref` names a global that was never declared.
    #[error("unknown global: \"{name}\"")]
    UnknownGlobal { name: String },

    /// `$include` of a document that is not part of the loaded content.
    #[error("included content not loaded: \"{path}\"")]
    IncludeNotLoaded { path: String },

    /// The template engine failed while expanding a template.
    #[error("template \"{name}\" failed: {message}")]
    Template { name: String, message: String },

    /// The output sink rejected the rendered file.
    #[error("could not emit output: {0}")]
    Sink(#[from] SinkError),

    /// A `$ref` or `$include` reached itself again while being resolved.
    #[error("cyclic reference: {chain}")]
    Cycle { chain: String },

    /// Content nested deeper than the renderer allows.
    #[error("render depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },
}

impl RenderError {
    pub(crate) fn template(name: &str, err: minijinja::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        RenderError::Template {
            name: name.to_string(),
            message,
        }
    }
}
