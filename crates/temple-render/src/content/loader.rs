//! Content loading.
//!
//! [`ContentLoader`] turns a YAML (or JSON) document into a [`ContentSet`]: the
//! classified root sequence, every transitively included document, and the
//! table of globals declared with `$globals`.
//!
//! Loading is a single pre-pass. Every `$include` reachable from the root, at
//! any depth and inside template fields or global entries, is resolved
//! relative to the directory of the document that names it, loaded once and
//! cached. The include target is rewritten to the resolved path so the
//! renderer can look the document up without knowing where it came from.
//! After the pre-pass the set is immutable, so a `$ref` can never observe a
//! half-populated globals table.
//!
//! Globals are only recognized on top-level nodes of a loaded document. They
//! are merged root first, then included documents in depth-first encounter
//! order, and a later definition of the same name replaces the earlier one.
//! A document is read once, but every further `$include` of it merges its
//! globals (and those of its own includes) again at that point, so
//! `[$include: a, $include: b, $include: a]` leaves `a`'s definitions in place.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use super::node::{Node, GLOBALS_KEY, INCLUDE_KEY};

/// Errors raised while loading content. All of them abort a run.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A content document could not be read.
    #[error("failed to read content {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A content document is not valid YAML.
    #[error("failed to parse content {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A `$globals` value that is not a mapping.
    #[error("$globals in {} must be a mapping of name to node", path.display())]
    InvalidGlobals { path: PathBuf },
}

/// Parses a content document into its top-level node values.
///
/// Blank input and `null` produce an empty list, a single non-sequence value
/// is wrapped into a one-element list. A stream of several YAML documents
/// (separated by `---`) is concatenated in order.
pub fn parse_document(text: &str) -> Result<Vec<Value>, serde_yaml::Error> {
    let mut values = Vec::new();
    if text.trim().is_empty() {
        return Ok(values);
    }

    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        values.extend(into_sequence(value));
    }
    Ok(values)
}

fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Named nodes available to `$ref`.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    entries: HashMap<String, Node>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a global, returning the definition it replaced.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Option<Node> {
        self.entries.insert(name.into(), node)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Fully loaded content, ready to render.
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    root: Vec<Node>,
    documents: HashMap<String, Vec<Node>>,
    globals: Globals,
}

impl ContentSet {
    /// Builds a set directly from parts. Mostly useful in tests.
    pub fn from_parts(
        root: Vec<Node>,
        documents: HashMap<String, Vec<Node>>,
        globals: Globals,
    ) -> Self {
        Self {
            root,
            documents,
            globals,
        }
    }

    /// Top-level nodes of the root document, in document order.
    pub fn root(&self) -> &[Node] {
        &self.root
    }

    /// An included document by its resolved path.
    pub fn document(&self, path: &str) -> Option<&[Node]> {
        self.documents.get(path).map(Vec::as_slice)
    }

    /// Number of included documents (the root is not counted).
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }
}

/// Loads content documents and everything they include.
#[derive(Debug, Default)]
pub struct ContentLoader {
    documents: HashMap<String, Vec<Node>>,
    globals: Globals,
    visited: HashSet<String>,
    merges: HashMap<String, GlobalsMerge>,
}

/// What loading a document contributed to the globals, for replay when the
/// document is included again.
#[derive(Debug, Clone, Default)]
struct GlobalsMerge {
    declared: Vec<(String, Node)>,
    includes: Vec<String>,
}

impl ContentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a content file. Includes resolve relative to its directory.
    pub fn load_path(self, path: impl AsRef<Path>) -> Result<ContentSet, LoadError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading content");
        let text = read_document(path)?;
        let values = parse_at(&text, path)?;
        let base_dir = parent_dir(path);
        self.finish(values, path, &base_dir)
    }

    /// Loads content from a string. Includes resolve relative to `base_dir`.
    pub fn load_str(self, text: &str, base_dir: impl AsRef<Path>) -> Result<ContentSet, LoadError> {
        let origin = PathBuf::from("<inline>");
        let values = parse_at(text, &origin)?;
        self.finish(values, &origin, base_dir.as_ref())
    }

    /// Loads already-parsed top-level values. Includes resolve relative to
    /// `base_dir`.
    pub fn load_values(
        self,
        values: Vec<Value>,
        base_dir: impl AsRef<Path>,
    ) -> Result<ContentSet, LoadError> {
        self.finish(values, Path::new("<inline>"), base_dir.as_ref())
    }

    fn finish(
        mut self,
        values: Vec<Value>,
        origin: &Path,
        base_dir: &Path,
    ) -> Result<ContentSet, LoadError> {
        let (root, _) = self.ingest(values, origin, base_dir)?;
        debug!(
            nodes = root.len(),
            documents = self.documents.len(),
            globals = self.globals.len(),
            "content loaded"
        );
        Ok(ContentSet {
            root,
            documents: self.documents,
            globals: self.globals,
        })
    }

    fn ingest(
        &mut self,
        mut values: Vec<Value>,
        origin: &Path,
        base_dir: &Path,
    ) -> Result<(Vec<Node>, GlobalsMerge), LoadError> {
        let mut includes = Vec::new();
        for value in &mut values {
            resolve_includes(value, base_dir, &mut includes);
        }

        let declared = self.register_globals(&values, origin)?;

        let mut merge = GlobalsMerge {
            declared,
            includes: Vec::with_capacity(includes.len()),
        };
        for include in includes {
            merge.includes.push(self.load_include(include)?);
        }

        Ok((values.iter().map(Node::from_value).collect(), merge))
    }

    /// Loads an included document once and returns its key. Later includes
    /// of the same document replay its globals instead.
    fn load_include(&mut self, path: PathBuf) -> Result<String, LoadError> {
        let key = path_key(&path);
        if !self.visited.insert(key.clone()) {
            trace!(path = %key, "include already loaded");
            self.replay_globals(&key, &mut HashSet::new());
            return Ok(key);
        }

        debug!(path = %key, "loading included content");
        let text = read_document(&path)?;
        let values = parse_at(&text, &path)?;
        let (nodes, merge) = self.ingest(values, &path, &parent_dir(&path))?;
        self.documents.insert(key.clone(), nodes);
        self.merges.insert(key.clone(), merge);
        Ok(key)
    }

    /// Merges the globals of an already loaded document again. Documents
    /// still being loaded (include cycles) have nothing to replay yet.
    fn replay_globals(&mut self, key: &str, seen: &mut HashSet<String>) {
        if !seen.insert(key.to_string()) {
            return;
        }
        let Some(merge) = self.merges.get(key).cloned() else {
            return;
        };
        for (name, node) in merge.declared {
            self.globals.insert(name, node);
        }
        for include in &merge.includes {
            self.replay_globals(include, seen);
        }
    }

    fn register_globals(
        &mut self,
        values: &[Value],
        origin: &Path,
    ) -> Result<Vec<(String, Node)>, LoadError> {
        let mut declared = Vec::new();
        for value in values {
            let Value::Object(map) = value else {
                continue;
            };
            let Some(raw_globals) = map.get(GLOBALS_KEY) else {
                continue;
            };
            let Value::Object(entries) = raw_globals else {
                return Err(LoadError::InvalidGlobals {
                    path: origin.to_path_buf(),
                });
            };

            for (name, raw) in entries {
                let node = Node::from_value(raw);
                if self.globals.insert(name.clone(), node.clone()).is_some() {
                    debug!(global = %name, origin = %origin.display(), "global redefined, last definition wins");
                }
                declared.push((name.clone(), node));
            }
        }
        Ok(declared)
    }
}

/// Rewrites every `$include` target under `value` to its resolved path and
/// records the paths in encounter order.
fn resolve_includes(value: &mut Value, base_dir: &Path, found: &mut Vec<PathBuf>) {
    match value {
        Value::Array(items) => {
            for item in items {
                resolve_includes(item, base_dir, found);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get_mut(INCLUDE_KEY) {
                let resolved = base_dir.join(target.as_str());
                *target = path_key(&resolved);
                found.push(resolved);
            }
            for (key, child) in map.iter_mut() {
                if key != INCLUDE_KEY {
                    resolve_includes(child, base_dir, found);
                }
            }
        }
        _ => {}
    }
}

fn read_document(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_at(text: &str, path: &Path) -> Result<Vec<Value>, LoadError> {
    parse_document(text).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
