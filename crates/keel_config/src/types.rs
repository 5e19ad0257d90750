//! Configuration types deserialized from `keel.toml`.

use serde::Deserialize;
use std::path::PathBuf;

/// Analysis output lines from files with these suffixes are hidden by default.
pub const DEFAULT_IGNORE_SUFFIXES: &[&str] = &[
    ".pb.go",
    ".pb.gw.go",
    "_string.go",
    "bindata.go",
    "bindata_assetfs.go",
    "static.go",
];

/// Arguments passed to the analysis tool ahead of the unit directory.
pub const DEFAULT_LINT_ARGS: &[&str] = &["--vendor", "--sort=path", "--deadline=5m"];

/// Name of the cache directory created under the first project root when no
/// explicit cache directory is configured.
pub const DEFAULT_CACHE_DIR: &str = ".keel-cache";

/// The top-level configuration.
///
/// Every section is optional; a missing file yields [`KeelConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeelConfig {
    /// External toolchain settings.
    pub toolchain: ToolchainConfig,
    /// Analysis and result-cache settings.
    pub lint: LintConfig,
}

/// Settings for the external compiler toolchain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Toolchain executable used for `list`, `generate`, `build` and `install`.
    pub go: String,
    /// Flags prepended to every `build` and `install` invocation.
    pub build_flags: Vec<String>,
    /// Regular expression forwarded to `generate -run`.
    pub generate_run: Option<String>,
    /// Entries whose presence marks a directory as a project root.
    pub project_markers: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            go: "go".to_string(),
            build_flags: Vec::new(),
            generate_run: None,
            project_markers: vec![".git".to_string()],
        }
    }
}

/// Settings for the analysis tool and its result cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Analysis executable, looked up on the search path.
    pub tool: String,
    /// Argument vector; the unit directory is appended last.
    pub args: Vec<String>,
    /// Lines whose source file ends with one of these suffixes are not shown.
    pub ignore_suffixes: Vec<String>,
    /// Hide "exported ... should have comment" warnings.
    pub hide_missing_comment: bool,
    /// Forward tool output verbatim with no filtering.
    pub raw: bool,
    /// Cache directory; defaults to `.keel-cache/lint` in the first project.
    pub cache_dir: Option<PathBuf>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            tool: "gometalinter".to_string(),
            args: DEFAULT_LINT_ARGS.iter().map(|s| s.to_string()).collect(),
            ignore_suffixes: DEFAULT_IGNORE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hide_missing_comment: false,
            raw: false,
            cache_dir: None,
        }
    }
}

impl LintConfig {
    /// Returns the configured cache directory, or the default location under
    /// `project_root`.
    pub fn resolve_cache_dir(&self, project_root: &std::path::Path) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| project_root.join(DEFAULT_CACHE_DIR).join("lint"))
    }
}
