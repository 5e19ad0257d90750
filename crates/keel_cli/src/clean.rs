//! `keel clean`: remove the analysis result cache.

use keel_cache::{OutputFilter, ResultCache};
use keel_workspace::find_project_root;
use tracing::info;

use crate::pipeline::{cache_dir, load_config};
use crate::GlobalArgs;

/// Removes the cache directory of the project containing the current
/// directory. A missing directory is not an error.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = load_config(global, &cwd)?;
    let root = find_project_root(&cwd, &config.toolchain.project_markers).unwrap_or_else(|| cwd.clone());

    let cache = ResultCache::new(cache_dir(global, &config, &root), OutputFilter::default());
    if cache.clean()? {
        info!(dir = %cache.dir().display(), "removed result cache");
    } else {
        info!(dir = %cache.dir().display(), "no result cache");
    }
    Ok(0)
}
