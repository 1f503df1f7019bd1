//! Embedded pipeline stage.
//!
//! [`Pipeline`] is the in-process counterpart of the `temple` binary, for
//! build tools that move files around as `(path, contents)` records. Template
//! records are pushed as they arrive; [`Pipeline::flush`] then loads the
//! content, renders it and returns every `$path` document as a
//! [`VirtualFile`].
//!
//! ```rust
//! use serde_json::json;
//! use temple::pipeline::{ContentSource, Pipeline, PipelineOptions};
//! use temple_render::VirtualFile;
//!
//! let content = ContentSource::Nodes(vec![
//!     json!({"$t": "page", "title": "Hi", "$path": "index.html"}),
//! ]);
//! let mut pipeline = Pipeline::new(content, PipelineOptions::default()).unwrap();
//! pipeline
//!     .push_template(VirtualFile::new("templates/page.html", "<h1><%= title %></h1>"))
//!     .unwrap();
//!
//! let files = pipeline.flush().unwrap();
//! assert_eq!(files, vec![VirtualFile::new("index.html", "<h1>Hi</h1>")]);
//! ```
//!
//! Node failures fail the stage with [`PipelineError::Failed`], which still
//! carries the files that were produced. With [`PipelineOptions::debug`] set
//! the stage succeeds instead and the error markers stay in the output.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use temple_render::{
    template_name, ContentLoader, ContentSet, LoadError, RegistryError, RenderFailure, Renderer,
    StreamSink, TemplateRegistry, VirtualFile,
};

/// Where the stage gets its content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    /// A content document on disk
    Path(PathBuf),
    /// Top-level nodes that were already loaded
    Nodes(Vec<Value>),
}

impl From<PathBuf> for ContentSource {
    fn from(path: PathBuf) -> Self {
        ContentSource::Path(path)
    }
}

impl From<&str> for ContentSource {
    fn from(path: &str) -> Self {
        ContentSource::Path(PathBuf::from(path))
    }
}

impl From<Vec<Value>> for ContentSource {
    fn from(nodes: Vec<Value>) -> Self {
        ContentSource::Nodes(nodes)
    }
}

/// Stage options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Succeed with error markers in the output instead of failing.
    pub debug: bool,
    /// Directory `$include` paths in [`ContentSource::Nodes`] resolve against.
    /// Defaults to the working directory.
    pub base_dir: Option<PathBuf>,
}

/// Errors that fail the stage.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("template error: {0}")]
    Template(#[from] RegistryError),

    #[error("content error: {0}")]
    Content(#[from] LoadError),

    #[error("{} node(s) failed to render", failures.len())]
    Failed {
        failures: Vec<RenderFailure>,
        files: Vec<VirtualFile>,
    },
}

/// A render stage fed with template records.
#[derive(Debug)]
pub struct Pipeline {
    content: ContentSource,
    options: PipelineOptions,
    templates: TemplateRegistry,
}

impl Pipeline {
    pub fn new(
        content: impl Into<ContentSource>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            content: content.into(),
            options,
            templates: TemplateRegistry::new()?,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Registers a template record under the name derived from its path.
    ///
    /// Records without a derivable name (dotfiles such as `.gitkeep`) are
    /// skipped, as they are when templates are read from a directory.
    pub fn push_template(&mut self, record: VirtualFile) -> Result<(), PipelineError> {
        if template_name(&record.path).is_none() {
            debug!(path = %record.path, "skipping template record without a name");
            return Ok(());
        }
        let name = self.templates.register_path(&record.path, record.contents)?;
        debug!(template = %name, path = %record.path, "template received");
        Ok(())
    }

    /// Number of templates registered so far.
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Loads the content, renders it and returns the produced files.
    pub fn flush(self) -> Result<Vec<VirtualFile>, PipelineError> {
        let content = self.load_content()?;
        let sink = Arc::new(StreamSink::new());
        let renderer = Renderer::new(Arc::new(self.templates), Arc::new(content), sink.clone());

        let outcome = renderer.render_content();
        let files = sink.take_files();
        debug!(files = files.len(), failures = outcome.failures.len(), "stage flushed");

        if outcome.failures.is_empty() {
            return Ok(files);
        }
        if self.options.debug {
            for failure in &outcome.failures {
                warn!(%failure, "render error kept in output");
            }
            return Ok(files);
        }
        Err(PipelineError::Failed {
            failures: outcome.failures,
            files,
        })
    }

    /// Pushes every record, then flushes.
    pub fn run(
        mut self,
        records: impl IntoIterator<Item = VirtualFile>,
    ) -> Result<Vec<VirtualFile>, PipelineError> {
        for record in records {
            self.push_template(record)?;
        }
        self.flush()
    }

    fn load_content(&self) -> Result<ContentSet, LoadError> {
        let loader = ContentLoader::new();
        match &self.content {
            ContentSource::Path(path) => loader.load_path(path),
            ContentSource::Nodes(nodes) => {
                let base_dir = self.options.base_dir.clone().unwrap_or_default();
                loader.load_values(nodes.clone(), base_dir)
            }
        }
    }
}
