//! Stable unit identities.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ContentHash;

/// The stable name of a compilation unit.
///
/// For package units this is the import path; for file units it is the
/// absolute file path. Ordering is plain lexical ordering of the name, which
/// is the single sort used for build order, analysis order and replay order.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
    /// Creates an identity from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the content hash of this identity.
    pub fn hash(&self) -> ContentHash {
        ContentHash::from_bytes(self.0.as_bytes())
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl From<&str> for UnitId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Renders a program and its arguments as a shell-like command line.
///
/// Arguments containing whitespace or quotes are double-quoted so the logged
/// line can be pasted back into a shell.
pub fn quote_command(program: &str, args: &[String]) -> String {
    let mut out = String::from(program);
    for arg in args {
        out.push(' ');
        if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
            out.push('"');
            out.push_str(&arg.replace('"', "\\\""));
            out.push('"');
        } else {
            out.push_str(arg);
        }
    }
    out
}
