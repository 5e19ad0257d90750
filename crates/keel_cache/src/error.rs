//! Error types for result caching and capture.

use std::path::PathBuf;

/// Errors raised while caching, replaying or capturing analysis output.
///
/// A failure affects only the unit being processed; other units' cache
/// files are never touched.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error on a cache file, the cache directory or the sink.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The analysis executable is not on the search path.
    #[error("analysis tool `{tool}` not found: {source}")]
    ToolMissing {
        /// The configured tool name.
        tool: String,
        /// The lookup failure.
        source: which::Error,
    },

    /// The analysis process could not be started.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        /// The quoted command line.
        command: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Writing to the output sink failed.
    #[error("failed to write analysis output: {0}")]
    Sink(#[source] std::io::Error),

    /// Reading the capture pipe failed.
    #[error("failed to read analysis output: {0}")]
    Pipe(#[source] std::io::Error),

    /// Waiting for the analysis process failed.
    #[error("failed to wait for analysis process: {0}")]
    Wait(#[source] std::io::Error),

    /// The task waiting for the analysis process panicked.
    #[error("analysis wait task panicked")]
    WaitPanicked,
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CacheError::Io { path, source }
    }
}
