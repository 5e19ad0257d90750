//! Revision identifiers used to stamp command artifacts.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// Supplies the current revision of a project as an opaque string.
pub trait RevisionSource: Send + Sync {
    /// Returns the revision of the project rooted at `root`, if known.
    fn revision(&self, root: &Path) -> Option<String>;
}

/// Reads the checked-out commit with `git rev-parse HEAD`.
#[derive(Debug, Clone, Default)]
pub struct GitRevision;

impl RevisionSource for GitRevision {
    fn revision(&self, root: &Path) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(root)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!rev.is_empty()).then_some(rev)
            }
            Ok(out) => {
                debug!(root = %root.display(), status = %out.status, "no revision available");
                None
            }
            Err(e) => {
                debug!(root = %root.display(), error = %e, "cannot run git");
                None
            }
        }
    }
}
