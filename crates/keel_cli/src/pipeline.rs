//! Shared setup for CLI commands: configuration lookup, build context
//! construction and workspace discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_config::{KeelConfig, CONFIG_FILE};
use keel_graph::{BuildContext, GitRevision, GoList, GoToolchain};
use keel_workspace::{find_project_root, DiscoverOptions, ProjectList};
use tracing::debug;

use crate::GlobalArgs;

/// Loads the configuration named by `--config`, or the nearest `keel.toml`
/// at or above `start`. Without either, defaults apply.
pub fn load_config(global: &GlobalArgs, start: &Path) -> Result<KeelConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &global.config {
        debug!(path = %path.display(), "loading configuration");
        return Ok(keel_config::load_config_file(path)?);
    }
    match find_project_root(start, &[CONFIG_FILE.to_string()]) {
        Some(dir) => {
            debug!(path = %dir.join(CONFIG_FILE).display(), "loading configuration");
            Ok(keel_config::load_config(&dir)?)
        }
        None => Ok(KeelConfig::default()),
    }
}

/// Builds the toolchain context from the configuration.
pub fn build_context(config: &KeelConfig) -> Arc<BuildContext> {
    let go = &config.toolchain.go;
    let ctx = BuildContext::new(Arc::new(GoToolchain::new(go)), Arc::new(GoList::new(go)))
        .with_build_flags(config.toolchain.build_flags.clone());
    Arc::new(ctx)
}

/// Discovers the projects containing `root`, listing `patterns` in each.
/// `run` overrides the configured generate filter.
pub fn discover(
    config: &KeelConfig,
    root: &Path,
    patterns: &[String],
    run: Option<&str>,
) -> Result<ProjectList, Box<dyn std::error::Error>> {
    let options = DiscoverOptions {
        markers: config.toolchain.project_markers.clone(),
        patterns: patterns.to_vec(),
        generate_run: run
            .map(str::to_string)
            .or_else(|| config.toolchain.generate_run.clone()),
    };
    let list = ProjectList::discover(build_context(config), &GitRevision, &[root.to_path_buf()], &options)?;
    Ok(list)
}

/// Resolves the analysis cache directory: `--cache-dir`, then the configured
/// directory, then the default location under `project_root`.
pub fn cache_dir(global: &GlobalArgs, config: &KeelConfig, project_root: &Path) -> PathBuf {
    global
        .cache_dir
        .clone()
        .unwrap_or_else(|| config.lint.resolve_cache_dir(project_root))
}
