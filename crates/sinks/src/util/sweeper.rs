//! Archive retention
//!
//! Deletes archives of one naming family, either those older than a maximum
//! age or all but the newest N. Only immediate entries of the directory are
//! considered, and only files the `NamingPolicy` recognises.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::naming::NamingPolicy;

/// How many archives survive a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPolicy {
    /// Keep the newest N archives; 0 disables sweeping
    ByCount(usize),
    /// Delete archives modified before now minus the duration
    ByAge(Duration),
}

/// Outcome of one sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Archives deleted
    pub removed: Vec<PathBuf>,
    /// Archives that could not be deleted
    pub failures: Vec<(PathBuf, io::Error)>,
}

/// Prunes a family of archives in one directory
#[derive(Debug, Clone)]
pub struct Sweeper {
    dir: PathBuf,
    naming: Arc<NamingPolicy>,
    policy: SweepPolicy,
    include_default_family: bool,
}

impl Sweeper {
    /// Sweeper for the archives `naming` produces in `dir`
    pub fn new(dir: impl Into<PathBuf>, naming: Arc<NamingPolicy>, policy: SweepPolicy) -> Self {
        Self {
            dir: dir.into(),
            naming,
            policy,
            include_default_family: false,
        }
    }

    /// Also sweep archives of the default naming scheme
    #[must_use]
    pub fn with_default_family(mut self, include: bool) -> Self {
        self.include_default_family = include;
        self
    }

    /// Retention policy
    pub fn policy(&self) -> SweepPolicy {
        self.policy
    }

    /// Apply the retention policy once
    pub fn sweep(&self) -> SweepReport {
        let family = self.family_files();
        let mut report = SweepReport::default();

        let doomed: Vec<PathBuf> = match self.policy {
            SweepPolicy::ByAge(age) => {
                let Some(cutoff) = SystemTime::now().checked_sub(age) else {
                    return report;
                };
                family
                    .into_iter()
                    .filter(|(mtime, _)| *mtime < cutoff)
                    .map(|(_, path)| path)
                    .collect()
            }
            SweepPolicy::ByCount(keep) => {
                if keep == 0 || family.len() <= keep {
                    return report;
                }
                let mut family = family;
                // Newest first, later names first on equal mtimes
                family.sort_by(|a, b| b.cmp(a));
                family.into_iter().skip(keep).map(|(_, path)| path).collect()
            }
        };

        for path in doomed {
            match fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => report.failures.push((path, e)),
            }
        }

        report
    }

    fn matches(&self, path: &Path) -> bool {
        self.naming.belongs(path) || (self.include_default_family && self.naming.belongs_to_default(path))
    }

    /// Family archives with their modification times
    fn family_files(&self) -> Vec<(SystemTime, PathBuf)> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "cannot list directory for sweep");
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .map(|entry| entry.path())
            .filter(|path| self.matches(path))
            .filter_map(|path| {
                let mtime = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((mtime, path))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "sweeper_test.rs"]
mod sweeper_test;
