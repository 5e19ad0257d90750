//! Analysis result cache and concurrent output capture.
//!
//! The cache stores the raw combined output of one analysis run per unit.
//! Units with a cached result are replayed; the rest are analyzed one at a
//! time, with the tool's output drained into the cache and the output sink
//! while a second task waits for the process to exit.

#![warn(missing_docs)]

pub mod analyzer;
pub mod cache;
pub mod capture;
pub mod error;
pub mod filter;

pub use analyzer::{AnalysisTarget, Analyzer, CommandLauncher, Launcher};
pub use cache::{ResultCache, StagedResult};
pub use capture::{capture, AnalysisProcess};
pub use error::CacheError;
pub use filter::OutputFilter;
