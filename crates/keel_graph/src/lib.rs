//! Dependency graph and staleness engine.
//!
//! A [`Unit`] is either a package (resolved through the toolchain's import
//! analysis) or a plain source file. Units resolve their direct dependencies
//! lazily and memoize them; a [`BuildPass`] walks the resulting DAG once per
//! unit, rebuilding only units whose artifact is older than their newest
//! transitive input.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod package;
pub mod pass;
pub mod revision;
pub mod toolchain;
pub mod unit;

pub use context::{BuildContext, ProjectScope};
pub use error::GraphError;
pub use package::PackageInfo;
pub use pass::{is_stale, BuildAction, BuildPass};
pub use revision::{GitRevision, RevisionSource};
pub use toolchain::{GoList, GoToolchain, PackageLoader, Toolchain};
pub use unit::{touch, FileUnit, PackageUnit, Unit};
