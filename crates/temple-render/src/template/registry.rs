//! Template registry.
//!
//! [`TemplateRegistry`] compiles template sources into a minijinja environment
//! and resolves them by name.
//!
//! # Template Names
//!
//! A template's name is derived from its path by [`template_name`]: the file
//! name of the last path segment, up to its first `.`. Directories play no
//! part, so these all register as `card`:
//!
//! | Path | Name |
//! |------|------|
//! | `templates/card.html` | `card` |
//! | `templates/partials/card.txt` | `card` |
//! | `card.en.html` | `card` |
//!
//! Registering a second source under an existing name replaces the first.
//! The later registration wins silently (it is logged at debug level).
//!
//! # Syntax
//!
//! Templates use ERB-style delimiters on top of minijinja:
//!
//! ```text
//! <%= title %>                       expression
//! <% for item in items %>…<% endfor %>  statement
//! <%# note %>                        comment
//! ```
//!
//! Expressions are not HTML-escaped. Use the builtin `escape` filter where
//! escaping is wanted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, Template};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use super::filters;

/// Error type for template registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A template source has a syntax error.
    #[error("template \"{name}\" failed to compile: {message}")]
    Compile { name: String, message: String },

    /// No name can be derived from the template path (e.g. a dotfile).
    #[error("cannot derive a template name from {}", path.display())]
    Unnamed { path: PathBuf },

    /// A template file could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template directory could not be traversed.
    #[error("failed to scan template directory {}: {message}", path.display())]
    Walk { path: PathBuf, message: String },

    /// The delimiter configuration was rejected by the template engine.
    #[error("invalid template syntax configuration: {0}")]
    Syntax(String),
}

/// A template file discovered during directory walking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Registry name derived from the file name
    pub name: String,
    /// Path to the template file
    pub path: PathBuf,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Derives a template name from a path.
///
/// Both `/` and `\` count as separators so that paths coming from other
/// platforms resolve the same way. Returns `None` when the file name starts
/// with a `.` or is empty.
pub fn template_name(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref().to_string_lossy();
    let file_name = path.rsplit(|c| c == '/' || c == '\\').next()?;
    let name = file_name.split('.').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn syntax() -> Result<SyntaxConfig, RegistryError> {
    SyntaxConfig::builder()
        .block_delimiters("<%", "%>")
        .variable_delimiters("<%=", "%>")
        .comment_delimiters("<%#", "%>")
        .build()
        .map_err(|e| RegistryError::Syntax(e.to_string()))
}

/// Compiled templates, resolved by name.
pub struct TemplateRegistry {
    env: Environment<'static>,
    /// name → path of the source that registered it (None for inline)
    origins: BTreeMap<String, Option<PathBuf>>,
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.origins)
            .finish()
    }
}

impl TemplateRegistry {
    /// Creates an empty registry with the helper filters installed.
    pub fn new() -> Result<Self, RegistryError> {
        let mut env = Environment::new();
        env.set_syntax(syntax()?);
        env.set_auto_escape_callback(|_: &str| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        filters::register_helpers(&mut env);

        Ok(Self {
            env,
            origins: BTreeMap::new(),
        })
    }

    /// Compiles and registers a template under an explicit name.
    ///
    /// An existing template with the same name is replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), RegistryError> {
        self.insert(name.into(), source.into(), None)
    }

    /// Compiles and registers a template under the name derived from `path`.
    ///
    /// Returns the derived name.
    pub fn register_path(
        &mut self,
        path: impl AsRef<Path>,
        source: impl Into<String>,
    ) -> Result<String, RegistryError> {
        let path = path.as_ref();
        let name = template_name(path).ok_or_else(|| RegistryError::Unnamed {
            path: path.to_path_buf(),
        })?;
        self.insert(name.clone(), source.into(), Some(path.to_path_buf()))?;
        Ok(name)
    }

    /// Reads and registers every template found under `root`.
    ///
    /// Returns the number of files registered.
    pub fn load_dir(&mut self, root: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let files = walk_template_dir(root)?;
        let count = files.len();
        for file in files {
            let source = fs::read_to_string(&file.path).map_err(|source| RegistryError::Read {
                path: file.path.clone(),
                source,
            })?;
            self.insert(file.name, source, Some(file.path))?;
        }
        Ok(count)
    }

    fn insert(
        &mut self,
        name: String,
        source: String,
        origin: Option<PathBuf>,
    ) -> Result<(), RegistryError> {
        self.env
            .add_template_owned(name.clone(), source)
            .map_err(|e| RegistryError::Compile {
                name: name.clone(),
                message: e.to_string(),
            })?;

        match self.origins.insert(name.clone(), origin.clone()) {
            Some(previous) => debug!(
                template = %name,
                previous = ?previous,
                replacement = ?origin,
                "template redefined, last registration wins"
            ),
            None => trace!(template = %name, origin = ?origin, "template registered"),
        }
        Ok(())
    }

    /// Looks up a compiled template. A miss is `None`, not an error.
    pub fn resolve(&self, name: &str) -> Option<Template<'_, '_>> {
        if !self.origins.contains_key(name) {
            return None;
        }
        self.env.get_template(name).ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.origins.contains_key(name)
    }

    /// Source path a template was registered from, if it came from a file.
    pub fn origin(&self, name: &str) -> Option<&Path> {
        self.origins.get(name)?.as_deref()
    }

    /// Registered template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.origins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walks a template directory and returns every file with a derivable name.
///
/// Hidden files and directories are skipped. Within each directory, files come
/// before subdirectories and both are sorted by name, so a template nested
/// deeper overrides a same-named one above it.
pub fn walk_template_dir(root: impl AsRef<Path>) -> Result<Vec<TemplateFile>, RegistryError> {
    let root = root.as_ref();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by(|a, b| {
            let a_dir = a.file_type().is_dir();
            let b_dir = b.file_type().is_dir();
            a_dir.cmp(&b_dir).then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|e| RegistryError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = template_name(entry.path()) {
            files.push(TemplateFile::new(name, entry.path()));
        }
    }

    Ok(files)
}
