//! A single dispatch pass over the dependency graph.
//!
//! The pass walks each requested unit's dependencies depth-first, builds any
//! stale buildable unit after its dependencies, and records the newest
//! modification time reachable from every visited unit. Each unit identity is
//! walked at most once per pass, so a dependency shared through several paths
//! is built at most once.

use std::collections::HashMap;
use std::time::SystemTime;

use keel_common::UnitId;
use tracing::debug;

use crate::error::GraphError;
use crate::unit::Unit;

/// What a pass does to a stale unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildAction {
    /// [`Unit::build`]: commands to their output path, libraries installed.
    Build,
    /// [`Unit::install`].
    Install,
}

/// Returns `true` if an artifact stamped at `artifact` must be rebuilt given
/// the newest input time `newest_input`. A missing artifact is always stale.
pub fn is_stale(artifact: Option<SystemTime>, newest_input: Option<SystemTime>) -> bool {
    match (artifact, newest_input) {
        (None, _) => true,
        (Some(stamp), Some(input)) => input > stamp,
        (Some(_), None) => false,
    }
}

#[derive(Debug, Clone, Copy)]
enum Visit {
    InProgress,
    Done(Option<SystemTime>),
}

/// Memo table and counters for one dispatch pass.
///
/// Not synchronized: a pass is driven from a single thread.
#[derive(Debug)]
pub struct BuildPass {
    action: BuildAction,
    visited: HashMap<UnitId, Visit>,
    built: usize,
}

impl BuildPass {
    /// Creates an empty pass.
    pub fn new(action: BuildAction) -> Self {
        Self {
            action,
            visited: HashMap::new(),
            built: 0,
        }
    }

    /// Returns the number of units built so far.
    pub fn built(&self) -> usize {
        self.built
    }

    /// Returns `true` if `id` has been walked in this pass.
    pub fn visited(&self, id: &UnitId) -> bool {
        self.visited.contains_key(id)
    }

    /// Brings `unit` up to date, building stale dependencies first.
    ///
    /// Returns the newest modification time reachable from the unit,
    /// including the unit's own (possibly fresh) artifact.
    pub fn visit(&mut self, unit: &Unit) -> Result<Option<SystemTime>, GraphError> {
        let id = unit.id();
        match self.visited.get(&id) {
            Some(Visit::Done(newest)) => return Ok(*newest),
            Some(Visit::InProgress) => return Ok(None),
            None => {}
        }
        self.visited.insert(id.clone(), Visit::InProgress);

        let mut newest = None;
        for dep in unit.dependencies()? {
            newest = newest.max(self.visit(dep)?);
        }

        if unit.buildable() {
            if is_stale(unit.artifact_time(), newest) {
                match self.action {
                    BuildAction::Build => unit.build()?,
                    BuildAction::Install => unit.install()?,
                }
                self.built += 1;
            } else {
                debug!(unit = %id, "up to date");
            }
        }

        let newest = newest.max(unit.mod_time());
        self.visited.insert(id, Visit::Done(newest));
        Ok(newest)
    }
}
