//! Shared foundational types used across the keel build orchestrator.
//!
//! This crate provides unit identities, content hashing for cache file
//! naming, exit classification, and small formatting helpers.

#![warn(missing_docs)]

pub mod exit;
pub mod hash;
pub mod unit_id;

pub use exit::{ExitTally, Outcome};
pub use hash::ContentHash;
pub use unit_id::{quote_command, UnitId};
