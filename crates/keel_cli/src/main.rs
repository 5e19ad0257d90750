//! Keel CLI: builds and analyzes every package of a multi-project workspace.
//!
//! `keel generate`, `keel build` and `keel install` dispatch toolchain work
//! over stale packages only; `keel lint` runs the analysis tool with a
//! per-package result cache; `keel clean` drops that cache.

#![warn(missing_docs)]

mod build;
mod clean;
mod lint;
mod pipeline;
mod version;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Keel: a workspace build orchestrator.
#[derive(Parser, Debug)]
#[command(name = "keel", version, about = "Keel workspace build orchestrator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `keel.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding cached analysis results.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run code generation in every project.
    Generate(BuildArgs),
    /// Generate, then compile every stale package.
    Build(BuildArgs),
    /// Generate, then install every stale package.
    Install(BuildArgs),
    /// Run the analysis tool over every package, reusing cached results.
    Lint(LintArgs),
    /// Remove the analysis result cache.
    Clean,
    /// Print the version.
    Version {
        /// Print only the version number.
        #[arg(short, long)]
        short: bool,
    },
}

/// Arguments shared by `generate`, `build` and `install`.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Regular expression selecting which generate directives run.
    #[arg(long)]
    pub run: Option<String>,

    /// Package patterns (default: `./...`).
    pub patterns: Vec<String>,
}

/// Arguments for the `keel lint` subcommand.
#[derive(Parser, Debug)]
pub struct LintArgs {
    /// Hide missing-comment warnings.
    #[arg(short = 'n')]
    pub hide_missing_comment: bool,

    /// Forward analysis output verbatim.
    #[arg(long)]
    pub raw: bool,

    /// Hide lines from files with this suffix (repeatable; replaces the
    /// configured list).
    #[arg(long = "ignore-suffix", value_name = "SUFFIX")]
    pub ignore_suffixes: Vec<String>,

    /// Regular expression selecting which generate directives run.
    #[arg(long)]
    pub run: Option<String>,

    /// Package patterns (default: `./...`).
    pub patterns: Vec<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
    /// Optional cache directory override.
    pub cache_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
        cache_dir: cli.cache_dir,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Generate(ref args) => build::run(build::Phase::Generate, args, &global),
        Command::Build(ref args) => build::run(build::Phase::Build, args, &global),
        Command::Install(ref args) => build::run(build::Phase::Install, args, &global),
        Command::Lint(ref args) => lint::run(args, &global),
        Command::Clean => clean::run(&global),
        Command::Version { short } => version::run(short),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Returns the default log filter for the verbosity flags.
fn default_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "info"
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over the
/// verbosity flags.
fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(global)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["keel", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.patterns.is_empty());
                assert!(args.run.is_none());
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_install_with_patterns_and_run() {
        let cli = Cli::parse_from(["keel", "install", "--run", "stringer", "./cmd/...", "./lib"]);
        match cli.command {
            Command::Install(ref args) => {
                assert_eq!(args.run.as_deref(), Some("stringer"));
                assert_eq!(args.patterns, vec!["./cmd/...", "./lib"]);
            }
            _ => panic!("expected Install command"),
        }
    }

    #[test]
    fn parse_generate() {
        let cli = Cli::parse_from(["keel", "generate"]);
        assert!(matches!(cli.command, Command::Generate(_)));
    }

    #[test]
    fn parse_lint_default() {
        let cli = Cli::parse_from(["keel", "lint"]);
        match cli.command {
            Command::Lint(ref args) => {
                assert!(!args.hide_missing_comment);
                assert!(!args.raw);
                assert!(args.ignore_suffixes.is_empty());
                assert!(args.patterns.is_empty());
            }
            _ => panic!("expected Lint command"),
        }
    }

    #[test]
    fn parse_lint_with_args() {
        let cli = Cli::parse_from([
            "keel",
            "lint",
            "-n",
            "--raw",
            "--ignore-suffix",
            ".pb.go",
            "--ignore-suffix",
            "_gen.go",
            "./lib/...",
        ]);
        match cli.command {
            Command::Lint(ref args) => {
                assert!(args.hide_missing_comment);
                assert!(args.raw);
                assert_eq!(args.ignore_suffixes, vec![".pb.go", "_gen.go"]);
                assert_eq!(args.patterns, vec!["./lib/..."]);
            }
            _ => panic!("expected Lint command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["keel", "--quiet", "--cache-dir", "/tmp/keel", "lint"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/keel")));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["keel", "build", "--verbose", "--config", "/p/keel.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/p/keel.toml")));
    }

    #[test]
    fn parse_version_short() {
        let cli = Cli::parse_from(["keel", "version", "-s"]);
        assert!(matches!(cli.command, Command::Version { short: true }));
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["keel", "clean"]);
        assert!(matches!(cli.command, Command::Clean));
    }

    #[test]
    fn verbosity_levels() {
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: None,
            cache_dir: None,
        };
        assert_eq!(default_level(&global), "info");
        global.verbose = true;
        assert_eq!(default_level(&global), "debug");
        global.quiet = true;
        assert_eq!(default_level(&global), "error");
    }
}
