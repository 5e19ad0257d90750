//! The ordered set of projects for one invocation and target dispatch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use keel_graph::{BuildAction, BuildContext, BuildPass, ProjectScope, RevisionSource, Unit};
use tracing::{debug, info};

use crate::error::WorkspaceError;
use crate::project::{find_project_root, Project};

/// Package pattern used when none is given: everything below the root.
pub const DEFAULT_PATTERN: &str = "./...";

/// A build phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Code generation; runs unconditionally in every project.
    Generate,
    /// Compile every stale unit.
    Compile,
    /// Install every stale unit.
    Install,
}

impl Target {
    fn action(self) -> Option<BuildAction> {
        match self {
            Target::Generate => None,
            Target::Compile => Some(BuildAction::Build),
            Target::Install => Some(BuildAction::Install),
        }
    }

    /// Returns `true` if `unit` is dispatched directly by this target.
    /// Vendored units are only built when an own unit depends on them.
    fn selects(self, unit: &Unit) -> bool {
        match self {
            Target::Generate => false,
            Target::Compile | Target::Install => unit.buildable() && !unit.is_vendored(),
        }
    }
}

/// Settings for [`ProjectList::discover`].
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Entries whose presence marks a directory as a project root.
    pub markers: Vec<String>,
    /// Package patterns; empty means [`DEFAULT_PATTERN`].
    pub patterns: Vec<String>,
    /// Regular expression forwarded to `generate -run`.
    pub generate_run: Option<String>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            markers: vec![".git".to_string()],
            patterns: Vec::new(),
            generate_run: None,
        }
    }
}

/// The projects under consideration for one invocation, sorted by root.
pub struct ProjectList {
    context: Arc<BuildContext>,
    projects: Vec<Project>,
    generate_run: Option<String>,
}

impl ProjectList {
    /// Discovers the projects containing `roots` and lists their units.
    ///
    /// Each root is resolved to the nearest enclosing project. Patterns are
    /// evaluated in the root itself, so a root below a project limits the
    /// listing to that subtree. Roots sharing a project are merged.
    pub fn discover(
        context: Arc<BuildContext>,
        revisions: &dyn RevisionSource,
        roots: &[PathBuf],
        options: &DiscoverOptions,
    ) -> Result<Self, WorkspaceError> {
        let patterns = if options.patterns.is_empty() {
            vec![DEFAULT_PATTERN.to_string()]
        } else {
            options.patterns.clone()
        };

        let mut projects: BTreeMap<PathBuf, Project> = BTreeMap::new();
        for root in roots {
            let root = root
                .canonicalize()
                .map_err(|e| WorkspaceError::Discovery {
                    root: root.clone(),
                    reason: e.to_string(),
                })?;
            let project_root = find_project_root(&root, &options.markers).ok_or_else(|| {
                WorkspaceError::NoProject {
                    root: root.clone(),
                    markers: options.markers.join(", "),
                }
            })?;

            let project = projects.entry(project_root.clone()).or_insert_with(|| {
                let revision = revisions.revision(&project_root);
                let scope = ProjectScope::new(&project_root, revision, Arc::clone(&context));
                Project::new(Arc::new(scope))
            });

            let packages = context.loader.list(&root, &patterns)?;
            let listed = packages.len();
            let mut added = 0;
            for info in packages {
                if project.add_package(info) {
                    added += 1;
                }
            }
            debug!(root = %root.display(), listed, added, "discovered packages");
        }

        Ok(Self {
            context,
            projects: projects.into_values().collect(),
            generate_run: options.generate_run.clone(),
        })
    }

    /// Returns the projects in root order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Returns the root of the first project, if any.
    pub fn first_root(&self) -> Option<&Path> {
        self.projects.first().map(Project::root)
    }

    /// Returns every non-vendored unit across all projects, sorted by
    /// identity and deduplicated.
    pub fn own_units(&self) -> Vec<Arc<Unit>> {
        let mut units: BTreeMap<_, _> = BTreeMap::new();
        for project in &self.projects {
            for unit in project.own_units() {
                units.entry(unit.id()).or_insert_with(|| Arc::clone(unit));
            }
        }
        units.into_values().collect()
    }

    /// Runs `target` over every project and returns how many units (or, for
    /// [`Target::Generate`], projects) were processed.
    ///
    /// Stops at the first failure, reporting how much was done before it in
    /// [`WorkspaceError::Build`]; zero is a valid "nothing to do" result.
    pub fn build(&self, target: Target) -> Result<usize, WorkspaceError> {
        let Some(action) = target.action() else {
            return self.generate();
        };

        let mut pass = BuildPass::new(action);
        for project in &self.projects {
            for unit in project.units().filter(|u| target.selects(u)) {
                if let Err(source) = pass.visit(unit) {
                    return Err(WorkspaceError::Build {
                        built: pass.built(),
                        source,
                    });
                }
            }
        }
        info!(target = ?target, built = pass.built(), "dispatch finished");
        Ok(pass.built())
    }

    fn generate(&self) -> Result<usize, WorkspaceError> {
        let mut args = vec!["generate".to_string()];
        if let Some(run) = &self.generate_run {
            args.push("-run".to_string());
            args.push(run.clone());
        }
        args.push(DEFAULT_PATTERN.to_string());

        for (done, project) in self.projects.iter().enumerate() {
            self.context
                .toolchain
                .exec(project.root(), &args)
                .map_err(|source| WorkspaceError::Build { built: done, source })?;
        }
        Ok(self.projects.len())
    }
}
