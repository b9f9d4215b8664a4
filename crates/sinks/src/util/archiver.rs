//! Log archiving
//!
//! Turns every closed `<stem>.log` in a directory into `<stem>.tgz`: a gzip
//! stream (best compression) around a tar holding the single original file
//! with its metadata. The source is removed once the archive is synced.
//! An existing archive is never replaced; the log stays and the clash is
//! reported.
//!
//! With a `NamingPolicy` attached only logs of that policy's family are
//! picked up, leaving other sinks' files in a shared directory alone.
//!
//! ```text
//! logs/app-17.log  ->  logs/app-17.tgz
//!                        └── app-17.log
//! ```
//!
//! Blocking I/O; the file sink runs it on the blocking pool.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;

use super::naming::{NamingPolicy, archive_name};

/// One file that could not be archived
#[derive(Debug)]
pub struct ArchiveFailure {
    /// Source log (or the directory, if it could not be listed)
    pub path: PathBuf,
    /// Underlying error
    pub source: io::Error,
}

/// Aggregated archiving failures
#[derive(Debug, Error)]
#[error("failed to archive {}", describe(.failures))]
pub struct ArchiveError {
    /// Archives that were written despite the failures
    pub archived: Vec<PathBuf>,
    /// Every file that failed
    pub failures: Vec<ArchiveFailure>,
}

fn describe(failures: &[ArchiveFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.source))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Archives written by a successful pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Paths of the new `.tgz` files
    pub archived: Vec<PathBuf>,
}

/// Compresses rotated log files in one directory
#[derive(Debug, Clone)]
pub struct Archiver {
    dir: PathBuf,
    naming: Option<Arc<NamingPolicy>>,
}

impl Archiver {
    /// Archiver for every `.log` in `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            naming: None,
        }
    }

    /// Only archive logs `naming` could have produced
    #[must_use]
    pub fn with_naming(mut self, naming: Arc<NamingPolicy>) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Directory being archived
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive every eligible `.log` file in the directory except `active`
    ///
    /// Non-recursive. A failing file does not stop the others; its partial
    /// archive is removed and the failure is reported in the aggregate error.
    pub fn archive(&self, active: Option<&str>) -> Result<ArchiveReport, ArchiveError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ArchiveError {
            archived: Vec::new(),
            failures: vec![ArchiveFailure {
                path: self.dir.clone(),
                source,
            }],
        })?;

        let mut candidates: Vec<(PathBuf, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let path = entry.path();
                let eligible = name.ends_with(".log")
                    && Some(name.as_str()) != active
                    && self.naming.as_ref().is_none_or(|n| n.owns_log(&path));
                eligible.then_some((path, name))
            })
            .collect();
        candidates.sort();

        let mut archived = Vec::with_capacity(candidates.len());
        let mut failures = Vec::new();

        for (source, name) in candidates {
            let target = self.dir.join(archive_name(&name));

            if let Err(e) = archive_file(&source, &name, &target) {
                failures.push(ArchiveFailure { path: source, source: e });
                continue;
            }

            if let Err(e) = fs::remove_file(&source) {
                failures.push(ArchiveFailure { path: source, source: e });
            }

            tracing::debug!(archive = %target.display(), "log archived");
            archived.push(target);
        }

        if failures.is_empty() {
            Ok(ArchiveReport { archived })
        } else {
            Err(ArchiveError { archived, failures })
        }
    }
}

/// Write `target` from `source`; a partial archive is removed on failure
fn archive_file(source: &Path, entry_name: &str, target: &Path) -> io::Result<()> {
    let input = File::open(source)?;
    let output = OpenOptions::new().write(true).create_new(true).open(target)?;

    write_archive(input, output, entry_name).inspect_err(|_| {
        let _ = fs::remove_file(target);
    })
}

fn write_archive(input: File, output: File, entry_name: &str) -> io::Result<()> {
    let metadata = input.metadata()?;
    let encoder = GzEncoder::new(output, Compression::best());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_metadata(&metadata);
    header.set_size(metadata.len());
    builder.append_data(&mut header, entry_name, input)?;

    let encoder = builder.into_inner()?;
    let output = encoder.finish()?;
    output.sync_all()
}

#[cfg(test)]
#[path = "archiver_test.rs"]
mod archiver_test;
