//! Concurrent capture of one analysis run.
//!
//! Two tasks cooperate: a waiter blocks on the process and closes the pipe's
//! write end once it exits, while the calling thread drains the read end into
//! the cache and the output sink. The reader sees end-of-stream only after the
//! process and the waiter have both let go of the write end, so a process that
//! fills the pipe never blocks on a reader that is itself waiting for exit.

use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;

use keel_common::Outcome;
use tracing::debug;

use crate::cache::ResultCache;
use crate::error::CacheError;

/// A running analysis process.
pub trait AnalysisProcess: Send {
    /// Blocks until the process exits and returns its exit code, or `None`
    /// if it was terminated by a signal.
    fn wait(&mut self) -> io::Result<Option<i32>>;
}

impl AnalysisProcess for std::process::Child {
    fn wait(&mut self) -> io::Result<Option<i32>> {
        std::process::Child::wait(self).map(|status| status.code())
    }
}

impl<P: AnalysisProcess + ?Sized> AnalysisProcess for Box<P> {
    fn wait(&mut self) -> io::Result<Option<i32>> {
        (**self).wait()
    }
}

/// Captures one run of `process` into the cache file at `path`.
///
/// `reader` is the read end of the pipe carrying the process's combined
/// output and `write_end` is the caller's copy of the write end; it is
/// dropped by the waiter once the process has exited. The cache file is
/// written only if both the drain and the wait succeed.
///
/// Returns the outcome classified from the process exit code.
pub fn capture<P, W>(
    cache: &ResultCache,
    out: &mut dyn Write,
    mut process: P,
    reader: &mut dyn Read,
    write_end: W,
    path: &Path,
) -> Result<Outcome, CacheError>
where
    P: AnalysisProcess,
    W: Send,
{
    let (staged, waited) = thread::scope(|s| {
        let waiter = s.spawn(move || {
            let status = process.wait();
            drop(write_end);
            status
        });

        let staged = cache.stage_result(out, reader);
        if staged.is_err() {
            // Keep the pipe flowing so the process can exit.
            let _ = io::copy(reader, &mut io::sink());
        }
        (staged, waiter.join())
    });

    let status = match waited {
        Ok(status) => status.map_err(CacheError::Wait)?,
        Err(_) => return Err(CacheError::WaitPanicked),
    };
    let staged = staged?;
    let bytes = staged.len();
    staged.commit(path)?;

    let outcome = Outcome::from_exit_code(status);
    debug!(path = %path.display(), bytes, ?status, ?outcome, "captured analysis result");
    Ok(outcome)
}
