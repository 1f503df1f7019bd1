//! # Temple
//!
//! Builds documents from structured content and named templates, either as
//! the `temple` command or as an embedded pipeline stage.
//!
//! - [`build`]: standalone builds ([`Site`], [`SiteConfig`])
//! - [`pipeline`]: record-in, record-out stage ([`Pipeline`])
//! - [`cli`]: argument parsing and exit codes for the binary
//!
//! The rendering itself lives in [`temple_render`], re-exported here as
//! [`render`].

pub mod build;
pub mod cli;
pub mod logging;
pub mod pipeline;

pub use temple_render as render;

pub use build::{BuildError, BuildReport, ConfigError, Site, SiteConfig};
pub use pipeline::{ContentSource, Pipeline, PipelineError, PipelineOptions};
