//! Package metadata as reported by the toolchain's `list -json` output.

use serde::Deserialize;
use std::path::PathBuf;

/// The pseudo-import used for foreign-function interfacing. It names no
/// real package and is never resolved.
pub const CGO_PSEUDO_IMPORT: &str = "C";

/// Package name that marks a command (an executable) rather than a library.
const COMMAND_PACKAGE: &str = "main";

/// Metadata for one package.
///
/// Field names follow the toolchain's JSON encoding. Missing lists decode as
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageInfo {
    /// Directory holding the package sources.
    pub dir: PathBuf,
    /// Import path; the package's unit identity.
    pub import_path: String,
    /// Package name (`main` for commands).
    pub name: String,
    /// Install location of the package's artifact, if it has one.
    pub target: Option<PathBuf>,
    /// Whether the package belongs to the toolchain's standard library.
    pub standard: bool,
    /// Primary source files.
    pub go_files: Vec<String>,
    /// Primary source files that use the foreign-function interface.
    pub cgo_files: Vec<String>,
    /// C sources.
    pub c_files: Vec<String>,
    /// C++ sources.
    #[serde(rename = "CXXFiles")]
    pub cxx_files: Vec<String>,
    /// Objective-C sources.
    pub m_files: Vec<String>,
    /// C, C++ and Objective-C headers.
    pub h_files: Vec<String>,
    /// Fortran sources.
    pub f_files: Vec<String>,
    /// Assembly sources.
    pub s_files: Vec<String>,
    /// SWIG interface files.
    pub swig_files: Vec<String>,
    /// SWIG C++ interface files.
    #[serde(rename = "SwigCXXFiles")]
    pub swig_cxx_files: Vec<String>,
    /// Pre-built object files linked into the package.
    pub syso_files: Vec<String>,
    /// Direct imports, sorted.
    pub imports: Vec<String>,
    /// Load error reported by the toolchain.
    pub error: Option<PackageError>,
}

/// A per-package load error embedded in the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackageError {
    /// Human-readable error text.
    pub err: String,
}

impl PackageInfo {
    /// Returns `true` if the package builds an executable.
    pub fn is_command(&self) -> bool {
        self.name == COMMAND_PACKAGE
    }

    /// Returns every tracked file of the package, by file class, as paths
    /// relative to [`dir`](Self::dir). Test files are not tracked.
    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        [
            &self.go_files,
            &self.cgo_files,
            &self.c_files,
            &self.cxx_files,
            &self.m_files,
            &self.h_files,
            &self.f_files,
            &self.s_files,
            &self.swig_files,
            &self.swig_cxx_files,
            &self.syso_files,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
    }

    /// Resolves symlinks in [`dir`](Self::dir) so it compares against
    /// canonical project roots. A directory that cannot be resolved is kept
    /// as reported.
    pub fn with_canonical_dir(mut self) -> Self {
        if let Ok(dir) = self.dir.canonicalize() {
            self.dir = dir;
        }
        self
    }

    /// Returns the last element of the import path, used to name command
    /// binaries that have no install target.
    pub fn base_name(&self) -> &str {
        self.import_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.import_path)
    }
}
