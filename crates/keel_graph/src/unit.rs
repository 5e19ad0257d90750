//! Compilation units: packages and source files.
//!
//! The set of unit kinds is closed, so [`Unit`] is an enum rather than a
//! trait object. Package units resolve their dependencies on first request
//! and keep the result for their lifetime.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use keel_common::UnitId;
use tracing::{debug, info};

use crate::context::ProjectScope;
use crate::error::GraphError;
use crate::package::{PackageInfo, CGO_PSEUDO_IMPORT};

/// Directory under a project root that holds freshness stamps for library
/// packages the toolchain installs nowhere.
const STAMP_DIR: &str = ".keel-cache/stamp";

/// A node in the dependency graph.
#[derive(Debug)]
pub enum Unit {
    /// A compiled package.
    Package(PackageUnit),
    /// A plain source file; always a leaf.
    File(FileUnit),
}

impl Unit {
    /// Returns the unit's stable identity.
    pub fn id(&self) -> UnitId {
        match self {
            Unit::Package(pkg) => UnitId::new(pkg.info.import_path.as_str()),
            Unit::File(file) => UnitId::new(file.path.to_string_lossy()),
        }
    }

    /// Returns the time of the unit's most recent change, or `None` if the
    /// underlying file does not exist.
    ///
    /// For a package this is its artifact's timestamp, so a rebuilt
    /// dependency makes its dependents stale.
    pub fn mod_time(&self) -> Option<SystemTime> {
        match self {
            Unit::Package(pkg) => pkg.artifact_time(),
            Unit::File(file) => modified(&file.path),
        }
    }

    /// Returns the timestamp of the unit's own build artifact.
    pub fn artifact_time(&self) -> Option<SystemTime> {
        match self {
            Unit::Package(pkg) => pkg.artifact_time(),
            Unit::File(_) => None,
        }
    }

    /// Returns `true` if the unit can itself be compiled.
    pub fn buildable(&self) -> bool {
        matches!(self, Unit::Package(_))
    }

    /// Returns `true` if the unit lives in a vendor directory.
    pub fn is_vendored(&self) -> bool {
        match self {
            Unit::Package(pkg) => pkg.vendored,
            Unit::File(_) => false,
        }
    }

    /// Returns the package metadata for package units.
    pub fn package(&self) -> Option<&PackageUnit> {
        match self {
            Unit::Package(pkg) => Some(pkg),
            Unit::File(_) => None,
        }
    }

    /// Compiles the unit. Commands are built to their artifact path, libraries
    /// are installed. File units have nothing to build.
    pub fn build(&self) -> Result<(), GraphError> {
        match self {
            Unit::Package(pkg) => pkg.build(),
            Unit::File(_) => Ok(()),
        }
    }

    /// Installs the unit. File units have nothing to install.
    pub fn install(&self) -> Result<(), GraphError> {
        match self {
            Unit::Package(pkg) => pkg.install(),
            Unit::File(_) => Ok(()),
        }
    }

    /// Returns the unit's direct dependencies, resolving them on first call.
    pub fn dependencies(&self) -> Result<&[Arc<Unit>], GraphError> {
        match self {
            Unit::Package(pkg) => pkg.dependencies(),
            Unit::File(_) => Ok(&[]),
        }
    }
}

/// A package resolved through the toolchain.
pub struct PackageUnit {
    info: PackageInfo,
    scope: Arc<ProjectScope>,
    vendored: bool,
    dependencies: OnceLock<Vec<Arc<Unit>>>,
}

impl std::fmt::Debug for PackageUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageUnit")
            .field("import_path", &self.info.import_path)
            .field("vendored", &self.vendored)
            .finish()
    }
}

impl PackageUnit {
    /// Creates a package unit owned by `scope`. Vendoring is derived from the
    /// package directory.
    pub fn new(info: PackageInfo, scope: Arc<ProjectScope>) -> Self {
        let vendored = scope.is_vendored(&info.dir);
        Self {
            info,
            scope,
            vendored,
            dependencies: OnceLock::new(),
        }
    }

    /// Returns the toolchain metadata.
    pub fn info(&self) -> &PackageInfo {
        &self.info
    }

    /// Returns `true` if the package lives in a vendor directory.
    pub fn is_vendored(&self) -> bool {
        self.vendored
    }

    /// Returns the path whose timestamp records the last successful build.
    ///
    /// This is the toolchain's install target when it has one. Otherwise
    /// commands build into `<root>/bin/<name>` and libraries get a stamp file
    /// under the project's cache directory.
    pub fn artifact_path(&self) -> PathBuf {
        match &self.info.target {
            Some(target) if !target.as_os_str().is_empty() => target.clone(),
            _ if self.info.is_command() => self.scope.root.join("bin").join(self.info.base_name()),
            _ => {
                let id = UnitId::new(self.info.import_path.as_str());
                self.scope.root.join(STAMP_DIR).join(id.hash().to_string())
            }
        }
    }

    fn artifact_time(&self) -> Option<SystemTime> {
        modified(&self.artifact_path())
    }

    /// Flags derived from the configured build flags and the project revision.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.scope.context.build_flags.clone();
        if self.info.is_command() {
            if let Some(rev) = &self.scope.revision {
                args.push("-ldflags".to_string());
                args.push(format!("-X main.gitCommit={rev}"));
            }
        }
        args
    }

    fn build(&self) -> Result<(), GraphError> {
        if !self.info.is_command() {
            return self.install();
        }

        let artifact = self.artifact_path();
        let mut args = vec!["build".to_string()];
        args.extend(self.build_args());
        args.push("-o".to_string());
        args.push(artifact.to_string_lossy().into_owned());
        args.push(self.info.import_path.clone());

        self.scope.context.toolchain.exec(&self.info.dir, &args)?;
        touch(&artifact)?;
        info!(unit = %self.info.import_path, "built");
        Ok(())
    }

    fn install(&self) -> Result<(), GraphError> {
        let mut args = vec!["install".to_string()];
        args.extend(self.build_args());
        args.push(self.info.import_path.clone());

        self.scope.context.toolchain.exec(&self.info.dir, &args)?;
        touch(&self.artifact_path())?;
        info!(unit = %self.info.import_path, "installed");
        Ok(())
    }

    fn dependencies(&self) -> Result<&[Arc<Unit>], GraphError> {
        if let Some(deps) = self.dependencies.get() {
            return Ok(deps);
        }
        let resolved = self.resolve()?;
        Ok(self.dependencies.get_or_init(|| resolved))
    }

    /// Resolves in-project imports, then the package's own files.
    fn resolve(&self) -> Result<Vec<Arc<Unit>>, GraphError> {
        let loader = &self.scope.context.loader;
        let mut deps = Vec::new();

        for import in &self.info.imports {
            if import == CGO_PSEUDO_IMPORT {
                continue;
            }
            let info = loader.import(import, &self.info.dir)?.with_canonical_dir();
            if info.standard || !self.scope.contains(&info.dir) {
                continue;
            }
            deps.push(Arc::new(Unit::Package(PackageUnit::new(
                info,
                Arc::clone(&self.scope),
            ))));
        }

        for file in self.info.source_files() {
            deps.push(Arc::new(Unit::File(FileUnit::new(self.info.dir.join(file)))));
        }

        debug!(unit = %self.info.import_path, count = deps.len(), "resolved dependencies");
        Ok(deps)
    }
}

/// A single source file.
#[derive(Debug, Clone)]
pub struct FileUnit {
    path: PathBuf,
}

impl FileUnit {
    /// Creates a file unit for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Sets the modification time of `path` to now, creating the file (and its
/// parent directories) if needed.
pub fn touch(path: &Path) -> Result<(), GraphError> {
    let stamp = |source| GraphError::Stamp {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(stamp)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(stamp)?;
    file.set_modified(SystemTime::now()).map_err(stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildContext;
    use crate::toolchain::{PackageLoader, Toolchain};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl Toolchain for Recorder {
        fn exec(&self, _dir: &Path, args: &[String]) -> Result<(), GraphError> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(())
        }
    }

    struct Failing;

    impl Toolchain for Failing {
        fn exec(&self, _dir: &Path, args: &[String]) -> Result<(), GraphError> {
            Err(GraphError::Toolchain {
                command: args.join(" "),
                status: "exit status: 2".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MapLoader {
        packages: HashMap<String, PackageInfo>,
        imports: AtomicUsize,
    }

    impl PackageLoader for MapLoader {
        fn list(&self, _: &Path, _: &[String]) -> Result<Vec<PackageInfo>, GraphError> {
            Ok(self.packages.values().cloned().collect())
        }

        fn import(&self, import: &str, src_dir: &Path) -> Result<PackageInfo, GraphError> {
            self.imports.fetch_add(1, Ordering::SeqCst);
            self.packages
                .get(import)
                .cloned()
                .ok_or_else(|| GraphError::Resolve {
                    import: import.to_string(),
                    dir: src_dir.to_path_buf(),
                    reason: "cannot find package".to_string(),
                })
        }
    }

    fn package(root: &Path, path: &str, name: &str, imports: &[&str]) -> PackageInfo {
        PackageInfo {
            dir: root.join(path),
            import_path: format!("example.com/{path}"),
            name: name.to_string(),
            target: Some(root.join("pkg").join(format!("{path}.a"))),
            go_files: vec![format!("{name}.go")],
            imports: imports.iter().map(|s| s.to_string()).collect(),
            ..PackageInfo::default()
        }
    }

    fn scope_with(
        root: &Path,
        toolchain: Arc<dyn Toolchain>,
        loader: Arc<dyn PackageLoader>,
        revision: Option<&str>,
    ) -> Arc<ProjectScope> {
        let ctx = BuildContext::new(toolchain, loader).with_build_flags(vec!["-v".to_string()]);
        Arc::new(ProjectScope::new(root, revision.map(String::from), Arc::new(ctx)))
    }

    #[test]
    fn dependencies_skip_cgo_std_and_outside_imports() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let mut loader = MapLoader::default();
        loader
            .packages
            .insert("example.com/lib".into(), package(root, "lib", "lib", &[]));
        loader.packages.insert(
            "fmt".into(),
            PackageInfo {
                dir: PathBuf::from("/usr/lib/go/src/fmt"),
                import_path: "fmt".into(),
                standard: true,
                ..PackageInfo::default()
            },
        );
        loader.packages.insert(
            "other.org/dep".into(),
            PackageInfo {
                dir: PathBuf::from("/elsewhere/dep"),
                import_path: "other.org/dep".into(),
                ..PackageInfo::default()
            },
        );
        let loader = Arc::new(loader);
        let scope = scope_with(root, Arc::new(Recorder::default()), loader.clone(), None);

        let info = package(root, "cmd/tool", "main", &["C", "example.com/lib", "fmt", "other.org/dep"]);
        let unit = Unit::Package(PackageUnit::new(info, scope));
        let ids: Vec<_> = unit
            .dependencies()
            .unwrap()
            .iter()
            .map(|d| d.id().to_string())
            .collect();

        assert_eq!(
            ids,
            vec![
                "example.com/lib".to_string(),
                root.join("cmd/tool/main.go").to_string_lossy().into_owned(),
            ]
        );
        // "C" is never handed to the loader.
        assert_eq!(loader.imports.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dependencies_are_memoized() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let mut loader = MapLoader::default();
        loader
            .packages
            .insert("example.com/lib".into(), package(root, "lib", "lib", &[]));
        let loader = Arc::new(loader);
        let scope = scope_with(root, Arc::new(Recorder::default()), loader.clone(), None);
        let unit = Unit::Package(PackageUnit::new(
            package(root, "app", "app", &["example.com/lib"]),
            scope,
        ));

        let first = unit.dependencies().unwrap().len();
        let second = unit.dependencies().unwrap().len();
        assert_eq!(first, second);
        assert_eq!(loader.imports.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unresolvable_import_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let scope = scope_with(
            tmp.path(),
            Arc::new(Recorder::default()),
            Arc::new(MapLoader::default()),
            None,
        );
        let unit = Unit::Package(PackageUnit::new(
            package(tmp.path(), "app", "app", &["example.com/missing"]),
            scope,
        ));
        assert!(matches!(
            unit.dependencies().unwrap_err(),
            GraphError::Resolve { .. }
        ));
    }

    #[test]
    fn file_unit_is_leaf_with_file_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.go");
        std::fs::write(&path, "package a\n").unwrap();
        let unit = Unit::File(FileUnit::new(&path));
        assert!(!unit.buildable());
        assert!(unit.dependencies().unwrap().is_empty());
        assert!(unit.mod_time().is_some());
        assert!(unit.artifact_time().is_none());
        assert!(unit.build().is_ok());
    }

    #[test]
    fn missing_file_has_no_mod_time() {
        let unit = Unit::File(FileUnit::new("/nonexistent/keel/a.go"));
        assert!(unit.mod_time().is_none());
    }

    #[test]
    fn library_build_installs_and_stamps() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let recorder = Arc::new(Recorder::default());
        let scope = scope_with(root, recorder.clone(), Arc::new(MapLoader::default()), Some("abc123"));
        let unit = Unit::Package(PackageUnit::new(package(root, "lib", "lib", &[]), scope));

        assert!(unit.artifact_time().is_none());
        unit.build().unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        // Libraries never receive the revision stamp.
        assert_eq!(calls[0], vec!["install", "-v", "example.com/lib"]);
        assert!(unit.artifact_time().is_some());
    }

    #[test]
    fn command_build_outputs_to_artifact_with_revision() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let recorder = Arc::new(Recorder::default());
        let scope = scope_with(root, recorder.clone(), Arc::new(MapLoader::default()), Some("abc123"));
        let info = package(root, "cmd/tool", "main", &[]);
        let artifact = info.target.clone().unwrap();
        let unit = Unit::Package(PackageUnit::new(info, scope));

        unit.build().unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            vec![
                "build".to_string(),
                "-v".to_string(),
                "-ldflags".to_string(),
                "-X main.gitCommit=abc123".to_string(),
                "-o".to_string(),
                artifact.to_string_lossy().into_owned(),
                "example.com/cmd/tool".to_string(),
            ]
        );
        assert!(artifact.exists());
    }

    #[test]
    fn command_install_uses_install() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let recorder = Arc::new(Recorder::default());
        let scope = scope_with(root, recorder.clone(), Arc::new(MapLoader::default()), None);
        let unit = Unit::Package(PackageUnit::new(package(root, "cmd/tool", "main", &[]), scope));

        unit.install().unwrap();
        assert_eq!(recorder.calls.lock().unwrap()[0][0], "install");
    }

    #[test]
    fn failed_build_leaves_no_stamp() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let scope = scope_with(root, Arc::new(Failing), Arc::new(MapLoader::default()), None);
        let unit = Unit::Package(PackageUnit::new(package(root, "lib", "lib", &[]), scope));

        assert!(matches!(unit.build().unwrap_err(), GraphError::Toolchain { .. }));
        assert!(unit.artifact_time().is_none());
    }

    #[test]
    fn artifact_fallbacks() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let scope = scope_with(root, Arc::new(Recorder::default()), Arc::new(MapLoader::default()), None);

        let mut cmd = package(root, "cmd/tool", "main", &[]);
        cmd.target = None;
        let cmd = PackageUnit::new(cmd, Arc::clone(&scope));
        assert_eq!(cmd.artifact_path(), root.join("bin").join("tool"));

        let mut lib = package(root, "lib", "lib", &[]);
        lib.target = None;
        let lib = PackageUnit::new(lib, scope);
        assert!(lib.artifact_path().starts_with(root.join(STAMP_DIR)));
    }

    #[test]
    fn vendored_flag_from_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let scope = scope_with(root, Arc::new(Recorder::default()), Arc::new(MapLoader::default()), None);
        let unit = Unit::Package(PackageUnit::new(
            package(root, "vendor/other.org/dep", "dep", &[]),
            scope,
        ));
        assert!(unit.is_vendored());
    }

    #[test]
    fn touch_advances_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/dir/artifact");
        touch(&path).unwrap();
        let old = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();
        touch(&path).unwrap();
        assert!(modified(&path).unwrap() > old);
    }

    #[test]
    fn touch_into_unwritable_location_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        // A regular file cannot be a parent directory.
        let err = touch(&blocker.join("artifact")).unwrap_err();
        assert!(matches!(err, GraphError::Stamp { .. }));
    }
}
