//! Standalone site builds.
//!
//! A [`Site`] turns a content file and a template directory into an output
//! directory:
//!
//! 1. validate the [`SiteConfig`]
//! 2. clear (or create) the output directory
//! 3. copy the static directory into it, if one is configured
//! 4. register every template under the template directory
//! 5. load the content, following `$include` and collecting `$globals`
//! 6. render every top-level node, writing `$path` nodes as files
//!
//! Steps 1 to 5 fail fast with a [`BuildError`]. Node-level failures during
//! step 6 never abort the build; they are returned in the [`BuildReport`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;

use temple_render::{
    ContentLoader, FileSink, LoadError, RegistryError, RenderFailure, Renderer, TemplateRegistry,
};

/// Paths for a standalone build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Root content document
    pub content: PathBuf,
    /// Directory holding the templates
    pub templates: PathBuf,
    /// Output directory, cleared before every build
    pub out: PathBuf,
    /// Directory copied verbatim into the output
    pub static_dir: Option<PathBuf>,
}

/// Invalid build configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("content file not found: {}", path.display())]
    ContentMissing { path: PathBuf },

    #[error("templates directory not found: {}", path.display())]
    TemplatesNotDir { path: PathBuf },

    #[error("static directory not found: {}", path.display())]
    StaticNotDir { path: PathBuf },

    #[error("output directory {} would overwrite input {}", out.display(), input.display())]
    OutputOverlapsInput { out: PathBuf, input: PathBuf },

    #[error("output path {} exists and is not a directory", path.display())]
    OutputNotDir { path: PathBuf },
}

/// Fatal build errors.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to prepare output directory {}: {source}", path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy static files from {}: {source}", path.display())]
    CopyStatic {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("template error: {0}")]
    Templates(#[from] RegistryError),

    #[error("content error: {0}")]
    Content(#[from] LoadError),
}

/// Summary of a finished build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Rendered files, in the order they were written
    pub files_written: Vec<PathBuf>,
    /// Number of static files copied
    pub static_files: usize,
    /// Node-level render failures
    pub failures: Vec<RenderFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl SiteConfig {
    pub fn new(
        content: impl Into<PathBuf>,
        templates: impl Into<PathBuf>,
        out: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content: content.into(),
            templates: templates.into(),
            out: out.into(),
            static_dir: None,
        }
    }

    pub fn with_static(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Checks that the inputs exist, that clearing the output directory
    /// cannot destroy any of them, and that the output does not sit inside an
    /// input directory that gets walked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.content.is_file() {
            return Err(ConfigError::ContentMissing {
                path: self.content.clone(),
            });
        }
        if !self.templates.is_dir() {
            return Err(ConfigError::TemplatesNotDir {
                path: self.templates.clone(),
            });
        }
        if let Some(dir) = &self.static_dir {
            if !dir.is_dir() {
                return Err(ConfigError::StaticNotDir { path: dir.clone() });
            }
        }
        if self.out.exists() && !self.out.is_dir() {
            return Err(ConfigError::OutputNotDir {
                path: self.out.clone(),
            });
        }

        let out = normalize(&self.out);
        let inputs = [Some(&self.content), Some(&self.templates), self.static_dir.as_ref()];
        for input in inputs.into_iter().flatten() {
            if normalize(input).starts_with(&out) {
                return Err(ConfigError::OutputOverlapsInput {
                    out: self.out.clone(),
                    input: input.clone(),
                });
            }
        }

        let walked = [Some(&self.templates), self.static_dir.as_ref()];
        for dir in walked.into_iter().flatten() {
            if out.starts_with(normalize(dir)) {
                return Err(ConfigError::OutputOverlapsInput {
                    out: self.out.clone(),
                    input: dir.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Absolute form of a path that may not exist yet.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => normalize(parent).join(name),
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// A standalone build.
#[derive(Debug, Clone)]
pub struct Site {
    config: SiteConfig,
}

impl Site {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Runs the build.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let config = &self.config;
        config.validate()?;

        prepare_output(&config.out)?;

        let static_files = match &config.static_dir {
            Some(dir) => {
                let copied = copy_static(dir, &config.out).map_err(|source| {
                    BuildError::CopyStatic {
                        path: dir.clone(),
                        source,
                    }
                })?;
                info!(files = copied, from = %dir.display(), "copied static files");
                copied
            }
            None => 0,
        };

        let mut templates = TemplateRegistry::new()?;
        let registered = templates.load_dir(&config.templates)?;
        info!(templates = registered, dir = %config.templates.display(), "registered templates");

        let content = ContentLoader::new().load_path(&config.content)?;

        let sink = Arc::new(FileSink::new(&config.out));
        let renderer = Renderer::new(Arc::new(templates), Arc::new(content), sink.clone());
        let outcome = renderer.render_content();

        if !outcome.output.trim().is_empty() {
            debug!(
                bytes = outcome.output.len(),
                "top-level output has no $path and was not written"
            );
        }

        let report = BuildReport {
            files_written: sink.written(),
            static_files,
            failures: outcome.failures,
        };
        info!(
            files = report.files_written.len(),
            failures = report.failures.len(),
            out = %config.out.display(),
            "build finished"
        );
        Ok(report)
    }
}

fn prepare_output(out: &Path) -> Result<(), BuildError> {
    let prepare = || -> io::Result<()> {
        if out.is_dir() {
            debug!(dir = %out.display(), "clearing output directory");
            fs::remove_dir_all(out)?;
        }
        fs::create_dir_all(out)
    };
    prepare().map_err(|source| BuildError::Prepare {
        path: out.to_path_buf(),
        source,
    })
}

/// Copies the tree under `from` into `to`, returning the number of files.
fn copy_static(from: &Path, to: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
