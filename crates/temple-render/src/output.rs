//! Output sinks.
//!
//! A node carrying `$path` hands its rendered text to an [`OutputSink`]. Two
//! sinks are provided:
//!
//! - [`FileSink`]: writes under an output root on disk
//! - [`StreamSink`]: collects [`VirtualFile`] records in memory for a
//!   downstream pipeline stage
//!
//! Output paths are always relative. Absolute paths and `..` components are
//! rejected so a content file cannot write outside the output root.

use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::util::lock;

/// A file record passed between pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualFile {
    /// Path relative to the output root
    pub path: String,
    /// File contents
    pub contents: String,
}

impl VirtualFile {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Errors raised while emitting a file.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("output path is empty")]
    EmptyPath,

    #[error("output path \"{path}\" escapes the output root")]
    OutsideRoot { path: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Receives finished output files.
pub trait OutputSink: Send + Sync {
    /// Emits `contents` at `path`, relative to the sink's root.
    fn emit(&self, path: &str, contents: &str) -> Result<(), SinkError>;
}

impl<S: OutputSink + ?Sized> OutputSink for Arc<S> {
    fn emit(&self, path: &str, contents: &str) -> Result<(), SinkError> {
        (**self).emit(path, contents)
    }
}

/// Validates an output path and returns it as a relative [`PathBuf`].
pub fn relative_output_path(path: &str) -> Result<PathBuf, SinkError> {
    if path.trim().is_empty() {
        return Err(SinkError::EmptyPath);
    }

    let mut relative = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SinkError::OutsideRoot {
                    path: path.to_string(),
                })
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(SinkError::EmptyPath);
    }
    Ok(relative)
}

/// Writes output files under a root directory.
///
/// Intermediate directories are created as needed and existing files are
/// overwritten.
#[derive(Debug)]
pub struct FileSink {
    root: PathBuf,
    written: Mutex<Vec<PathBuf>>,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths written so far, in emission order.
    pub fn written(&self) -> Vec<PathBuf> {
        lock(&self.written).clone()
    }
}

impl OutputSink for FileSink {
    fn emit(&self, path: &str, contents: &str) -> Result<(), SinkError> {
        let target = self.root.join(relative_output_path(path)?);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SinkError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&target, contents).map_err(|source| SinkError::Write {
            path: target.clone(),
            source,
        })?;

        debug!(path = %target.display(), bytes = contents.len(), "wrote output file");
        lock(&self.written).push(target);
        Ok(())
    }
}

/// Collects output files in memory.
///
/// Emitting the same path twice replaces the earlier record in place.
#[derive(Debug, Default)]
pub struct StreamSink {
    files: Mutex<Vec<VirtualFile>>,
}

impl StreamSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the collected files.
    pub fn files(&self) -> Vec<VirtualFile> {
        lock(&self.files).clone()
    }

    /// Drains the collected files.
    pub fn take_files(&self) -> Vec<VirtualFile> {
        std::mem::take(&mut *lock(&self.files))
    }

    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.files).is_empty()
    }
}

impl OutputSink for StreamSink {
    fn emit(&self, path: &str, contents: &str) -> Result<(), SinkError> {
        let normalized = relative_output_path(path)?
            .to_string_lossy()
            .replace('\\', "/");

        let mut files = lock(&self.files);
        match files.iter_mut().find(|file| file.path == normalized) {
            Some(existing) => existing.contents = contents.to_string(),
            None => files.push(VirtualFile::new(normalized, contents)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relative_output_path() {
        assert_eq!(
            relative_output_path("a/./b/index.html").unwrap(),
            PathBuf::from("a/b/index.html")
        );
        assert!(matches!(
            relative_output_path("../escape.html"),
            Err(SinkError::OutsideRoot { .. })
        ));
        assert!(matches!(
            relative_output_path("/etc/passwd"),
            Err(SinkError::OutsideRoot { .. })
        ));
        assert!(matches!(relative_output_path(""), Err(SinkError::EmptyPath)));
        assert!(matches!(relative_output_path("./"), Err(SinkError::EmptyPath)));
    }

    #[test]
    fn test_file_sink_creates_directories_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let sink = FileSink::new(temp.path());

        sink.emit("posts/2024/hello.html", "first").unwrap();
        sink.emit("posts/2024/hello.html", "second").unwrap();

        let written = temp.path().join("posts/2024/hello.html");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "second");
        assert_eq!(sink.written(), vec![written.clone(), written]);
    }

    #[test]
    fn test_file_sink_rejects_escape() {
        let temp = TempDir::new().unwrap();
        let sink = FileSink::new(temp.path().join("out"));
        assert!(sink.emit("../oops.html", "x").is_err());
        assert!(!temp.path().join("oops.html").exists());
    }

    #[test]
    fn test_stream_sink_collects_in_order() {
        let sink = StreamSink::new();
        sink.emit("b.html", "B").unwrap();
        sink.emit("./a.html", "A").unwrap();

        assert_eq!(
            sink.files(),
            vec![VirtualFile::new("b.html", "B"), VirtualFile::new("a.html", "A")]
        );
    }

    #[test]
    fn test_stream_sink_replaces_same_path() {
        let sink = StreamSink::new();
        sink.emit("index.html", "old").unwrap();
        sink.emit("other.html", "x").unwrap();
        sink.emit("index.html", "new").unwrap();

        let files = sink.take_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], VirtualFile::new("index.html", "new"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_arc_sink_forwards() {
        let sink = Arc::new(StreamSink::new());
        let shared: Arc<dyn OutputSink> = sink.clone();
        shared.emit("x.txt", "x").unwrap();
        assert_eq!(sink.len(), 1);
    }
}
