//! On-disk store of captured analysis output, one file per unit.
//!
//! A cache file that exists and is non-empty is a valid result. Entries are
//! never expired; deleting the file (or the whole directory with
//! [`ResultCache::clean`]) is the only invalidation.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use keel_common::UnitId;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CacheError;
use crate::filter::OutputFilter;

/// File extension of cache entries.
const RESULT_EXT: &str = "out";

/// Result cache rooted at one directory.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
    filter: OutputFilter,
}

impl ResultCache {
    /// Creates a cache in `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>, filter: OutputFilter) -> Self {
        Self {
            dir: dir.into(),
            filter,
        }
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the cache file path for `id`. Creates nothing.
    pub fn cache_file(&self, id: &UnitId) -> PathBuf {
        self.dir.join(format!("{}.{RESULT_EXT}", id.hash()))
    }

    /// Returns `true` if a non-empty cache file exists for `id`.
    pub fn have_result(&self, id: &UnitId) -> Result<bool, CacheError> {
        let path = self.cache_file(id);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Replays the cached result at `path` to `out`.
    ///
    /// Returns `true` if the replayed result is a failure, meaning at least
    /// one non-blank line was shown.
    pub fn show_result(&self, out: &mut dyn Write, path: &Path) -> Result<bool, CacheError> {
        let file = File::open(path).map_err(CacheError::io(path))?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        let mut failed = false;

        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(CacheError::io(path))?;
            if n == 0 {
                break;
            }
            failed |= self.forward(out, &line).map_err(CacheError::Sink)?;
        }
        out.flush().map_err(CacheError::Sink)?;
        debug!(path = %path.display(), failed, "replayed cached result");
        Ok(failed)
    }

    /// Drains `reader` into the cache file at `path`, showing the filtered
    /// stream on `out` as it arrives.
    pub fn read_result(
        &self,
        out: &mut dyn Write,
        reader: &mut dyn Read,
        path: &Path,
    ) -> Result<(), CacheError> {
        self.stage_result(out, reader)?.commit(path)
    }

    /// Drains `reader` into a temporary file in the cache directory, showing
    /// the filtered stream on `out`. Nothing is visible at any cache path
    /// until the returned result is committed.
    pub fn stage_result(
        &self,
        out: &mut dyn Write,
        reader: &mut dyn Read,
    ) -> Result<StagedResult, CacheError> {
        self.ensure_dir()?;
        let mut file = NamedTempFile::new_in(&self.dir).map_err(CacheError::io(&self.dir))?;
        let tmp_path = file.path().to_path_buf();
        let write_err = |source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        };

        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        let mut bytes = 0u64;
        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(CacheError::Pipe)?;
            if n == 0 {
                break;
            }
            file.write_all(&line).map_err(write_err)?;
            bytes += n as u64;
            self.forward(out, &line).map_err(CacheError::Sink)?;
        }

        file.flush().map_err(write_err)?;
        out.flush().map_err(CacheError::Sink)?;
        Ok(StagedResult { file, bytes })
    }

    /// Creates the cache directory with owner-only permissions. Safe to
    /// repeat.
    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.dir).map_err(CacheError::io(&self.dir))
    }

    /// Removes the cache directory. Returns `false` if it did not exist.
    pub fn clean(&self) -> Result<bool, CacheError> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io {
                path: self.dir.clone(),
                source: e,
            }),
        }
    }

    /// Writes one captured line to `out` if the filter lets it through.
    /// Returns `true` if a non-blank line was shown.
    fn forward(&self, out: &mut dyn Write, line: &[u8]) -> io::Result<bool> {
        let text = String::from_utf8_lossy(line);
        let trimmed = text.trim_end_matches(['\n', '\r']);
        if !self.filter.passes(trimmed) {
            return Ok(false);
        }
        if self.filter.is_raw() {
            out.write_all(line)?;
        } else {
            out.write_all(trimmed.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(!trimmed.trim().is_empty())
    }
}

/// A fully drained capture waiting to be moved into place.
///
/// Dropping it without committing deletes the temporary file.
#[derive(Debug)]
pub struct StagedResult {
    file: NamedTempFile,
    bytes: u64,
}

impl StagedResult {
    /// Returns the number of bytes captured.
    pub fn len(&self) -> u64 {
        self.bytes
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically replaces the cache file at `path` with the staged output.
    pub fn commit(self, path: &Path) -> Result<(), CacheError> {
        self.file
            .persist(path)
            .map(|_| ())
            .map_err(|e| CacheError::Io {
                path: path.to_path_buf(),
                source: e.error,
            })
    }
}
