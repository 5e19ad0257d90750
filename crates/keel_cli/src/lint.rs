//! `keel lint`: run the analysis tool over every own package, replaying
//! cached results for packages analyzed before.
//!
//! 1. Discover projects and run code generation
//! 2. Resolve the analysis tool on the search path
//! 3. Replay or analyze each package in identity order
//! 4. Exit 1 if any package failed

use std::io::{self, Write};

use keel_cache::{AnalysisTarget, Analyzer, CommandLauncher, OutputFilter, ResultCache};
use keel_config::KeelConfig;
use keel_workspace::{ProjectList, Target};
use tracing::debug;

use crate::pipeline::{cache_dir, discover, load_config};
use crate::{GlobalArgs, LintArgs};

/// Runs the `keel lint` command.
///
/// Returns exit code 0 if every package passed and 1 otherwise.
pub fn run(args: &LintArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = load_config(global, &cwd)?;
    let projects = discover(&config, &cwd, &args.patterns, args.run.as_deref())?;

    projects.build(Target::Generate)?;

    let filter = merge_filter(&config, args);
    let launcher = CommandLauncher::new(&config.lint.tool, config.lint.args.clone(), filter.is_raw())?;
    let root = projects.first_root().unwrap_or(cwd.as_path());
    let cache = ResultCache::new(cache_dir(global, &config, root), filter);
    debug!(dir = %cache.dir().display(), "using result cache");

    let analyzer = Analyzer::new(cache, launcher);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let tally = analyzer.run(&mut out, analysis_targets(&projects))?;
    out.flush()?;

    Ok(tally.overall().code())
}

/// Merges CLI flags over the `[lint]` section. Flags only ever switch
/// filtering options on; `--ignore-suffix` replaces the configured list.
fn merge_filter(config: &KeelConfig, args: &LintArgs) -> OutputFilter {
    let suffixes = if args.ignore_suffixes.is_empty() {
        config.lint.ignore_suffixes.clone()
    } else {
        args.ignore_suffixes.clone()
    };
    OutputFilter::new(suffixes)
        .hide_missing_comment(args.hide_missing_comment || config.lint.hide_missing_comment)
        .raw(args.raw || config.lint.raw)
}

/// Returns the analysis targets for every own package unit.
fn analysis_targets(projects: &ProjectList) -> Vec<AnalysisTarget> {
    projects
        .own_units()
        .iter()
        .filter_map(|unit| {
            unit.package().map(|pkg| AnalysisTarget {
                id: unit.id(),
                dir: pkg.info().dir.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> LintArgs {
        LintArgs {
            hide_missing_comment: false,
            raw: false,
            ignore_suffixes: Vec::new(),
            run: None,
            patterns: Vec::new(),
        }
    }

    const MISSING: &str = "a.go:1:1:warning: exported func A should have comment or be unexported (golint)";

    #[test]
    fn config_suffixes_apply_by_default() {
        let filter = merge_filter(&KeelConfig::default(), &args());
        assert!(!filter.passes("api/x.pb.go:1:1:warning: w"));
        assert!(filter.passes(MISSING));
    }

    #[test]
    fn cli_suffixes_replace_config() {
        let mut a = args();
        a.ignore_suffixes = vec!["_gen.go".to_string()];
        let filter = merge_filter(&KeelConfig::default(), &a);
        assert!(filter.passes("api/x.pb.go:1:1:warning: w"));
        assert!(!filter.passes("api/x_gen.go:1:1:warning: w"));
    }

    #[test]
    fn flags_enable_hiding_and_raw() {
        let mut a = args();
        a.hide_missing_comment = true;
        assert!(!merge_filter(&KeelConfig::default(), &a).passes(MISSING));

        let mut config = KeelConfig::default();
        config.lint.raw = true;
        let filter = merge_filter(&config, &args());
        assert!(filter.is_raw());
        assert!(filter.passes("api/x.pb.go:1:1:warning: w"));
    }
}
