//! `keel generate`, `keel build` and `keel install`.

use keel_workspace::Target;
use tracing::info;

use crate::pipeline::{discover, load_config};
use crate::{BuildArgs, GlobalArgs};

/// Which build command is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Code generation only.
    Generate,
    /// Generate, then compile.
    Build,
    /// Generate, then install.
    Install,
}

impl Phase {
    /// The target run after generation, if any.
    fn target(self) -> Option<Target> {
        match self {
            Phase::Generate => None,
            Phase::Build => Some(Target::Compile),
            Phase::Install => Some(Target::Install),
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Phase::Generate => "generate",
            Phase::Build => "build",
            Phase::Install => "install",
        }
    }
}

/// Runs a build command over the projects containing the current directory.
pub fn run(phase: Phase, args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = load_config(global, &cwd)?;
    let projects = discover(&config, &cwd, &args.patterns, args.run.as_deref())?;

    projects.build(Target::Generate)?;

    if let Some(target) = phase.target() {
        let built = projects.build(target)?;
        if built == 0 {
            info!("nothing to {}", phase.verb());
        } else {
            info!(built, "{} finished", phase.verb());
        }
    }
    Ok(0)
}
