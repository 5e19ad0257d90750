//! Error types for dependency resolution and unit builds.

use std::path::PathBuf;

/// Errors raised while resolving or building units.
///
/// None of these are retried; each aborts the current dispatch pass.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The toolchain could not enumerate packages for a pattern set.
    #[error("failed to list packages in {dir}: {reason}")]
    List {
        /// Directory the listing ran in.
        dir: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An import could not be located by the toolchain.
    #[error("cannot resolve import \"{import}\" from {dir}: {reason}")]
    Resolve {
        /// The import path that failed.
        import: String,
        /// Directory of the importing package.
        dir: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The toolchain could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The quoted command line.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The toolchain ran but reported failure.
    #[error("`{command}` failed: {status}")]
    Toolchain {
        /// The quoted command line.
        command: String,
        /// The exit status description.
        status: String,
    },

    /// An artifact's freshness marker could not be updated after a
    /// successful build.
    #[error("failed to stamp artifact {path}: {source}")]
    Stamp {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
