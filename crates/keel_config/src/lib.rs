//! Parsing and validation of `keel.toml` configuration files.
//!
//! This crate reads the optional configuration file and produces a
//! strongly-typed [`KeelConfig`] that is handed to the graph and cache
//! components at construction time.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use types::*;
