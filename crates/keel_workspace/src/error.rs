//! Error types for discovery and dispatch.

use std::path::PathBuf;

use keel_graph::GraphError;

/// Errors raised while discovering projects or dispatching a target.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// A root could not be enumerated.
    #[error("cannot discover projects under {root}: {reason}")]
    Discovery {
        /// The root being discovered.
        root: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// No project marker was found at or above a root.
    #[error("no project root ({markers}) found at or above {root}")]
    NoProject {
        /// The root that was searched from.
        root: PathBuf,
        /// The marker names that were looked for.
        markers: String,
    },

    /// A unit failed to build; `built` units were built before it.
    #[error("{source} ({built} built before the failure)")]
    Build {
        /// Units (or, for code generation, projects) completed first.
        built: usize,
        /// The failure that stopped dispatch.
        #[source]
        source: GraphError,
    },

    /// A listing or resolution failure inside the graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
