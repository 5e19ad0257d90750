//! Seams to the external compiler toolchain.
//!
//! [`Toolchain`] runs build-phase commands; [`PackageLoader`] answers package
//! listing and import resolution queries. The real implementations shell out
//! to the configured `go` executable; tests substitute in-memory doubles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use keel_common::quote_command;
use tracing::debug;

use crate::error::GraphError;
use crate::package::PackageInfo;

/// Runs toolchain subcommands (`generate`, `build`, `install`).
pub trait Toolchain: Send + Sync {
    /// Runs the toolchain with `args` in `dir`. A non-success exit is an error.
    fn exec(&self, dir: &Path, args: &[String]) -> Result<(), GraphError>;
}

/// Lists packages and resolves imports.
pub trait PackageLoader: Send + Sync {
    /// Lists the packages matching `patterns`, evaluated in `dir`.
    fn list(&self, dir: &Path, patterns: &[String]) -> Result<Vec<PackageInfo>, GraphError>;

    /// Resolves `import` as seen from a package in `src_dir`.
    fn import(&self, import: &str, src_dir: &Path) -> Result<PackageInfo, GraphError>;
}

/// [`Toolchain`] backed by a real executable.
///
/// Compiler diagnostics are inherited by the parent process so they reach the
/// user directly.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    program: String,
}

impl GoToolchain {
    /// Creates a toolchain that runs `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Toolchain for GoToolchain {
    fn exec(&self, dir: &Path, args: &[String]) -> Result<(), GraphError> {
        let command = quote_command(&self.program, args);
        debug!(dir = %dir.display(), "→ {command}");

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .env("PWD", dir)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| GraphError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(GraphError::Toolchain {
                command,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// [`PackageLoader`] backed by `<program> list -e -json`.
///
/// Import resolutions are memoized for the loader's lifetime, keyed by the
/// import path and the importing directory (vendored imports resolve
/// differently per directory).
#[derive(Debug)]
pub struct GoList {
    program: String,
    resolved: Mutex<HashMap<(String, PathBuf), PackageInfo>>,
}

impl GoList {
    /// Creates a loader that runs `program list`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    fn run_list(&self, dir: &Path, targets: &[String]) -> Result<Vec<PackageInfo>, String> {
        let mut args = vec!["list".to_string(), "-e".to_string(), "-json".to_string()];
        args.extend(targets.iter().cloned());
        let command = quote_command(&self.program, &args);
        debug!(dir = %dir.display(), "→ {command}");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(dir)
            .env("PWD", dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| format!("failed to run `{command}`: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("`{command}` failed: {}", stderr.trim()));
        }

        decode_listing(&output.stdout).map_err(|e| format!("cannot decode `{command}` output: {e}"))
    }
}

/// Decodes the concatenated JSON objects printed by `list -json`.
pub fn decode_listing(bytes: &[u8]) -> Result<Vec<PackageInfo>, serde_json::Error> {
    serde_json::Deserializer::from_slice(bytes)
        .into_iter::<PackageInfo>()
        .collect()
}

impl PackageLoader for GoList {
    fn list(&self, dir: &Path, patterns: &[String]) -> Result<Vec<PackageInfo>, GraphError> {
        let packages = self.run_list(dir, patterns).map_err(|reason| GraphError::List {
            dir: dir.to_path_buf(),
            reason,
        })?;

        if let Some(err) = packages.iter().find_map(|p| {
            p.error
                .as_ref()
                .map(|e| format!("{}: {}", p.import_path, e.err))
        }) {
            return Err(GraphError::List {
                dir: dir.to_path_buf(),
                reason: err,
            });
        }
        Ok(packages)
    }

    fn import(&self, import: &str, src_dir: &Path) -> Result<PackageInfo, GraphError> {
        let key = (import.to_string(), src_dir.to_path_buf());
        if let Some(info) = self.resolved.lock().unwrap().get(&key) {
            return Ok(info.clone());
        }

        let resolve_err = |reason: String| GraphError::Resolve {
            import: import.to_string(),
            dir: src_dir.to_path_buf(),
            reason,
        };

        let mut packages = self
            .run_list(src_dir, &[import.to_string()])
            .map_err(resolve_err)?;
        let info = match packages.pop() {
            Some(info) if packages.is_empty() => info,
            _ => return Err(resolve_err("expected exactly one package".to_string())),
        };
        if let Some(err) = &info.error {
            return Err(resolve_err(err.err.clone()));
        }

        self.resolved.lock().unwrap().insert(key, info.clone());
        Ok(info)
    }
}
