//! Projects, discovery and build-target dispatch.
//!
//! A [`ProjectList`] groups the discovered units by project root and drives
//! the code-generation, compile and install targets over them in a
//! deterministic order.

#![warn(missing_docs)]

pub mod error;
pub mod project;
pub mod workspace;

pub use error::WorkspaceError;
pub use project::{find_project_root, Project};
pub use workspace::{DiscoverOptions, ProjectList, Target, DEFAULT_PATTERN};
