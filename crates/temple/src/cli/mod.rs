//! The `temple` command line.
//!
//! [`Args`] is parsed by clap; [`run`] performs the build and maps the result
//! to an exit code:
//!
//! | Outcome | Exit code |
//! |---------|-----------|
//! | build finished | 0 |
//! | build finished with node errors | 0, or 1 with `--strict` |
//! | invalid configuration, unreadable content or templates | 1 |
//! | usage error (missing or unknown flag) | 2 (clap) |

mod args;

pub use args::Args;

use std::process::ExitCode;

use anyhow::Context;
use tracing::warn;

use crate::build::Site;

/// Runs a standalone build for parsed arguments.
pub fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let site = Site::new(args.site_config());
    let report = site
        .build()
        .with_context(|| format!("build of {} failed", args.content.display()))?;

    for failure in &report.failures {
        warn!(%failure, "node rendered as error marker");
    }

    if !args.quiet {
        println!(
            "Wrote {} file(s) to {}",
            report.files_written.len(),
            args.out.display()
        );
    }

    if report.is_success() {
        return Ok(ExitCode::SUCCESS);
    }

    eprintln!("{} node(s) failed to render", report.failures.len());
    if args.strict {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
