//! A project: an ownership root and its units.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_common::UnitId;
use keel_graph::{PackageInfo, PackageUnit, ProjectScope, Unit};

/// An ownership root containing an ordered, deduplicated set of units.
pub struct Project {
    scope: Arc<ProjectScope>,
    units: BTreeMap<UnitId, Arc<Unit>>,
}

impl Project {
    /// Creates an empty project for `scope`.
    pub fn new(scope: Arc<ProjectScope>) -> Self {
        Self {
            scope,
            units: BTreeMap::new(),
        }
    }

    /// Returns the project root directory.
    pub fn root(&self) -> &Path {
        &self.scope.root
    }

    /// Adds a package to the project. Packages outside the root (after
    /// resolving symlinks) and standard packages are ignored; a package already present is kept as is.
    ///
    /// Returns `true` if the package was added.
    pub fn add_package(&mut self, info: PackageInfo) -> bool {
        let info = info.with_canonical_dir();
        if info.standard || !self.scope.contains(&info.dir) {
            return false;
        }
        let id = UnitId::new(info.import_path.as_str());
        if self.units.contains_key(&id) {
            return false;
        }
        let unit = Unit::Package(PackageUnit::new(info, Arc::clone(&self.scope)));
        self.units.insert(id, Arc::new(unit));
        true
    }

    /// Returns all units sorted by identity, vendored ones included.
    pub fn units(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.units.values()
    }

    /// Returns the units sorted by identity, skipping vendored ones.
    pub fn own_units(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.units.values().filter(|u| !u.is_vendored())
    }

    /// Returns the number of units, vendored ones included.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the project has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Walks up from `start` looking for the nearest directory containing any of
/// `markers`.
pub fn find_project_root(start: &Path, markers: &[String]) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if markers.iter().any(|m| current.join(m).exists()) {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_graph::{BuildContext, GraphError, PackageLoader, Toolchain};
    use std::fs;
    use tempfile::TempDir;

    struct Nop;

    impl Toolchain for Nop {
        fn exec(&self, _: &Path, _: &[String]) -> Result<(), GraphError> {
            Ok(())
        }
    }

    impl PackageLoader for Nop {
        fn list(&self, _: &Path, _: &[String]) -> Result<Vec<PackageInfo>, GraphError> {
            Ok(Vec::new())
        }
        fn import(&self, import: &str, dir: &Path) -> Result<PackageInfo, GraphError> {
            Err(GraphError::Resolve {
                import: import.to_string(),
                dir: dir.to_path_buf(),
                reason: "unused".to_string(),
            })
        }
    }

    fn project(root: &Path) -> Project {
        let ctx = Arc::new(BuildContext::new(Arc::new(Nop), Arc::new(Nop)));
        Project::new(Arc::new(ProjectScope::new(root, None, ctx)))
    }

    fn info(root: &Path, rel: &str) -> PackageInfo {
        PackageInfo {
            dir: root.join(rel),
            import_path: format!("example.com/{rel}"),
            name: "x".to_string(),
            ..PackageInfo::default()
        }
    }

    #[test]
    fn find_project_root_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        let root = find_project_root(tmp.path(), &[".git".to_string()]).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("go.mod"), "module example.com\n").unwrap();
        let sub = tmp.path().join("cmd/tool");
        fs::create_dir_all(&sub).unwrap();
        let markers = [".git".to_string(), "go.mod".to_string()];
        assert_eq!(find_project_root(&sub, &markers).unwrap(), tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let marker = "keel-test-marker-that-does-not-exist".to_string();
        assert!(find_project_root(tmp.path(), &[marker]).is_none());
    }

    #[test]
    fn units_are_sorted_and_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let mut p = project(root);
        assert!(p.add_package(info(root, "z")));
        assert!(p.add_package(info(root, "a")));
        assert!(!p.add_package(info(root, "z")));
        let ids: Vec<_> = p.units().map(|u| u.id().to_string()).collect();
        assert_eq!(ids, ["example.com/a", "example.com/z"]);
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn outside_and_standard_packages_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut p = project(tmp.path());
        let outside = PackageInfo {
            dir: PathBuf::from("/elsewhere/x"),
            import_path: "other.org/x".to_string(),
            ..PackageInfo::default()
        };
        let mut standard = info(tmp.path(), "fmt");
        standard.standard = true;
        assert!(!p.add_package(outside));
        assert!(!p.add_package(standard));
        assert!(p.is_empty());
    }

    #[test]
    fn vendored_units_are_flagged_not_removed() {
        let tmp = TempDir::new().unwrap();
        let root = &tmp.path().canonicalize().unwrap();
        let mut p = project(root);
        p.add_package(info(root, "lib"));
        p.add_package(info(root, "vendor/other.org/dep"));
        assert_eq!(p.units().count(), 2);
        let own: Vec<_> = p.own_units().map(|u| u.id().to_string()).collect();
        assert_eq!(own, ["example.com/lib"]);
    }
}
