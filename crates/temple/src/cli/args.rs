use std::path::PathBuf;

use clap::Parser;

use crate::build::SiteConfig;

/// Render structured content into documents through named templates.
#[derive(Debug, Clone, Parser)]
#[command(name = "temple", version, about, long_about = None)]
pub struct Args {
    /// Root content document (YAML or JSON)
    #[arg(long, env = "TEMPLE_CONTENT", value_name = "FILE")]
    pub content: PathBuf,

    /// Directory of templates; each file is registered under its base name
    #[arg(long, env = "TEMPLE_TEMPLATES", value_name = "DIR")]
    pub templates: PathBuf,

    /// Output directory, cleared before every build
    #[arg(long, env = "TEMPLE_OUT", value_name = "DIR")]
    pub out: PathBuf,

    /// Directory copied verbatim into the output
    #[arg(long = "static", env = "TEMPLE_STATIC", value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Exit with an error when any node failed to render
    #[arg(long)]
    pub strict: bool,

    /// Log every step
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn site_config(&self) -> SiteConfig {
        SiteConfig {
            content: self.content.clone(),
            templates: self.templates.clone(),
            out: self.out.clone(),
            static_dir: self.static_dir.clone(),
        }
    }

    /// Default log filter for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("temple").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_required_flags() {
        let args = parse(&["--content", "c.yml", "--templates", "t", "--out", "o"]).unwrap();
        let config = args.site_config();
        assert_eq!(config.content, PathBuf::from("c.yml"));
        assert_eq!(config.templates, PathBuf::from("t"));
        assert_eq!(config.out, PathBuf::from("o"));
        assert_eq!(config.static_dir, None);
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn test_parse_optional_flags() {
        let args = parse(&[
            "--content", "c.yml", "--templates", "t", "--out", "o", "--static", "s", "--strict", "-v",
        ])
        .unwrap();
        assert_eq!(args.static_dir, Some(PathBuf::from("s")));
        assert!(args.strict);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let err = parse(&["--content", "c", "--templates", "t", "--out", "o", "-v", "-q"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
