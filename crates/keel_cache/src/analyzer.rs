//! Drives the analysis tool over a set of units, replaying cached results.

use std::collections::VecDeque;
use std::io::{self, PipeWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use keel_common::{quote_command, ExitTally, Outcome, UnitId};
use tracing::{debug, info};

use crate::cache::ResultCache;
use crate::capture::{capture, AnalysisProcess};
use crate::error::CacheError;

/// A unit to analyze: its identity and source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTarget {
    /// Cache key.
    pub id: UnitId,
    /// Directory passed to the tool.
    pub dir: PathBuf,
}

/// Starts the analysis tool on one directory.
pub trait Launcher {
    /// Starts the tool on `dir` with its stdout and stderr both attached to
    /// `output`. Any handles the launcher keeps must be closed on return.
    fn launch(
        &self,
        dir: &Path,
        output: &PipeWriter,
    ) -> Result<Box<dyn AnalysisProcess>, CacheError>;
}

/// Launches an external executable found on the search path.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    tool: String,
    program: PathBuf,
    args: Vec<String>,
    raw: bool,
}

impl CommandLauncher {
    /// Resolves `tool` on the search path. Fails with
    /// [`CacheError::ToolMissing`] if it is not installed.
    pub fn new(tool: &str, args: Vec<String>, raw: bool) -> Result<Self, CacheError> {
        let program = which::which(tool).map_err(|source| CacheError::ToolMissing {
            tool: tool.to_string(),
            source,
        })?;
        Ok(Self {
            tool: tool.to_string(),
            program,
            args,
            raw,
        })
    }
}

impl Launcher for CommandLauncher {
    fn launch(
        &self,
        dir: &Path,
        output: &PipeWriter,
    ) -> Result<Box<dyn AnalysisProcess>, CacheError> {
        let mut args = self.args.clone();
        args.push(dir.display().to_string());
        let command = quote_command(&self.tool, &args);
        if !self.raw {
            debug!("→ {command}");
        }

        let stdout = output.try_clone().map_err(CacheError::Pipe)?;
        let stderr = output.try_clone().map_err(CacheError::Pipe)?;
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| CacheError::Launch { command, source })?;
        Ok(Box::new(child))
    }
}

/// Runs analysis over units, reusing cached results where present.
pub struct Analyzer<L> {
    cache: ResultCache,
    launcher: L,
}

impl<L: Launcher> Analyzer<L> {
    /// Creates an analyzer over `cache` launching through `launcher`.
    pub fn new(cache: ResultCache, launcher: L) -> Self {
        Self { cache, launcher }
    }

    /// Returns the result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Returns the launcher.
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Sorts `targets` by identity and selects the ones without a cached
    /// result, in the same order.
    pub fn partition(
        &self,
        mut targets: Vec<AnalysisTarget>,
    ) -> Result<(Vec<AnalysisTarget>, VecDeque<UnitId>), CacheError> {
        targets.sort_by(|a, b| a.id.cmp(&b.id));
        targets.dedup_by(|a, b| a.id == b.id);

        let mut to_run = VecDeque::new();
        for target in &targets {
            if !self.cache.have_result(&target.id)? {
                to_run.push_back(target.id.clone());
            }
        }
        Ok((targets, to_run))
    }

    /// Analyzes every target in identity order, writing results to `out`.
    ///
    /// Targets without a cached result are run one at a time and captured;
    /// the rest are replayed. Stops at the first error; results already
    /// written stay in the cache.
    pub fn run(
        &self,
        out: &mut dyn Write,
        targets: Vec<AnalysisTarget>,
    ) -> Result<ExitTally<UnitId>, CacheError> {
        let (targets, mut to_run) = self.partition(targets)?;
        info!(
            units = targets.len(),
            cached = targets.len() - to_run.len(),
            "analyzing"
        );
        self.cache.ensure_dir()?;

        let mut tally = ExitTally::new();
        for target in targets {
            let path = self.cache.cache_file(&target.id);
            let outcome = if to_run.front() == Some(&target.id) {
                to_run.pop_front();
                self.analyze(out, &target, &path)?
            } else if self.cache.show_result(out, &path)? {
                Outcome::Failed
            } else {
                Outcome::Ok
            };
            out.flush().map_err(CacheError::Sink)?;
            tally.record(target.id, outcome);
        }
        Ok(tally)
    }

    fn analyze(
        &self,
        out: &mut dyn Write,
        target: &AnalysisTarget,
        path: &Path,
    ) -> Result<Outcome, CacheError> {
        let (mut reader, writer) = io::pipe().map_err(CacheError::Pipe)?;
        let process = self.launcher.launch(&target.dir, &writer)?;
        debug!(unit = %target.id, "analysis started");
        capture(&self.cache, out, process, &mut reader, writer, path)
    }
}
