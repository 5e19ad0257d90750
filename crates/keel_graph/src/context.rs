//! Explicit configuration carried by every unit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::toolchain::{PackageLoader, Toolchain};

/// Invocation-wide collaborators and settings shared by all units.
pub struct BuildContext {
    /// Runs `generate`, `build` and `install`.
    pub toolchain: Arc<dyn Toolchain>,
    /// Lists packages and resolves imports.
    pub loader: Arc<dyn PackageLoader>,
    /// Flags prepended to every `build`/`install` invocation.
    pub build_flags: Vec<String>,
}

impl BuildContext {
    /// Creates a context with no extra build flags.
    pub fn new(toolchain: Arc<dyn Toolchain>, loader: Arc<dyn PackageLoader>) -> Self {
        Self {
            toolchain,
            loader,
            build_flags: Vec::new(),
        }
    }

    /// Sets the flags prepended to every build.
    pub fn with_build_flags(mut self, flags: Vec<String>) -> Self {
        self.build_flags = flags;
        self
    }
}

/// The project a unit belongs to.
///
/// Imports resolving outside [`root`](Self::root) are not tracked.
pub struct ProjectScope {
    /// The project's root directory.
    pub root: PathBuf,
    /// Revision used to stamp command artifacts.
    pub revision: Option<String>,
    /// Shared invocation context.
    pub context: Arc<BuildContext>,
}

impl ProjectScope {
    /// Creates a scope for the project rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, revision: Option<String>, context: Arc<BuildContext>) -> Self {
        Self {
            root: root.into(),
            revision,
            context,
        }
    }

    /// Returns `true` if `dir` lies inside the project root.
    pub fn contains(&self, dir: &Path) -> bool {
        dir.starts_with(&self.root)
    }

    /// Returns `true` if `dir` lies in a `vendor` directory of this project.
    pub fn is_vendored(&self, dir: &Path) -> bool {
        dir.strip_prefix(&self.root)
            .map(|rel| rel.components().any(|c| c.as_os_str() == "vendor"))
            .unwrap_or(false)
    }
}
