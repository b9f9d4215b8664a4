//! Tests for archive retention

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use filetime::FileTime;
use tempfile::TempDir;

use super::*;

/// Create `name` in `dir` with an mtime `age_secs` in the past
fn touch(dir: &Path, name: &str, age_secs: u64) {
    let path = dir.join(name);
    fs::write(&path, b"archive").unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    filetime::set_file_mtime(&path, FileTime::from_system_time(mtime)).unwrap();
}

fn remaining(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

fn pattern_policy() -> Arc<NamingPolicy> {
    Arc::new(NamingPolicy::new("server", Some("app-*")).unwrap())
}

// =============================================================================
// Count mode
// =============================================================================

#[test]
fn test_count_keeps_newest() {
    let dir = TempDir::new().unwrap();
    for (i, age) in [500, 400, 300, 200, 100].iter().enumerate() {
        touch(dir.path(), &format!("app-{i}.tgz"), *age);
    }

    let report = Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(2)).sweep();

    assert_eq!(report.removed.len(), 3);
    assert!(report.failures.is_empty());
    assert_eq!(remaining(dir.path()), vec!["app-3.tgz", "app-4.tgz"]);
}

#[test]
fn test_count_under_limit_keeps_all() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "app-1.tgz", 10);
    touch(dir.path(), "app-2.tgz", 20);

    let report = Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(2)).sweep();

    assert!(report.removed.is_empty());
    assert_eq!(remaining(dir.path()).len(), 2);
}

#[test]
fn test_count_zero_disables() {
    let dir = TempDir::new().unwrap();
    for i in 0..4 {
        touch(dir.path(), &format!("app-{i}.tgz"), 10 * i);
    }

    let report = Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(0)).sweep();

    assert!(report.removed.is_empty());
    assert_eq!(remaining(dir.path()).len(), 4);
}

#[test]
fn test_count_tie_break_by_name() {
    let dir = TempDir::new().unwrap();
    for name in ["app-1.tgz", "app-2.tgz", "app-3.tgz"] {
        touch(dir.path(), name, 0);
    }
    let same = FileTime::from_unix_time(1_700_000_000, 0);
    for name in ["app-1.tgz", "app-2.tgz", "app-3.tgz"] {
        filetime::set_file_mtime(dir.path().join(name), same).unwrap();
    }

    Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(1)).sweep();

    assert_eq!(remaining(dir.path()), vec!["app-3.tgz"]);
}

#[test]
fn test_only_family_files_swept() {
    let dir = TempDir::new().unwrap();
    for i in 0..3 {
        touch(dir.path(), &format!("app-{i}.tgz"), 100 + i);
    }
    touch(dir.path(), "other-1.tgz", 1000);
    touch(dir.path(), "app-9.log", 1000);
    touch(dir.path(), "notes.txt", 1000);

    Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(1)).sweep();

    assert_eq!(
        remaining(dir.path()),
        vec!["app-0.tgz", "app-9.log", "notes.txt", "other-1.tgz"]
    );
}

#[test]
fn test_default_family_is_opt_in() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "server-2024-01-01T000000.tgz", 300);
    touch(dir.path(), "server-2024-01-02T000000.tgz", 200);
    touch(dir.path(), "app-1.tgz", 100);

    Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(1)).sweep();
    assert_eq!(remaining(dir.path()).len(), 3);

    Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(1))
        .with_default_family(true)
        .sweep();
    assert_eq!(remaining(dir.path()), vec!["app-1.tgz"]);
}

#[test]
fn test_default_scheme_family() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "server-2024-01-01T000000.tgz", 300);
    touch(dir.path(), "server-2024-01-02T000000.tgz", 200);
    touch(dir.path(), "server-2024-01-03T000000.tgz", 100);

    let naming = Arc::new(NamingPolicy::new("server", None).unwrap());
    Sweeper::new(dir.path(), naming, SweepPolicy::ByCount(2)).sweep();

    assert_eq!(
        remaining(dir.path()),
        vec!["server-2024-01-02T000000.tgz", "server-2024-01-03T000000.tgz"]
    );
}

#[test]
fn test_subdirectories_ignored() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("app-1.tgz")).unwrap();
    touch(dir.path(), "app-2.tgz", 100);
    touch(dir.path(), "app-3.tgz", 50);

    let report = Sweeper::new(dir.path(), pattern_policy(), SweepPolicy::ByCount(1)).sweep();

    assert_eq!(report.removed, vec![dir.path().join("app-2.tgz")]);
    assert!(dir.path().join("app-1.tgz").is_dir());
}

// =============================================================================
// Age mode
// =============================================================================

#[test]
fn test_age_removes_old_archives() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "app-1.tgz", 3 * 3600);
    touch(dir.path(), "app-2.tgz", 2 * 3600);
    touch(dir.path(), "app-3.tgz", 60);

    let report = Sweeper::new(
        dir.path(),
        pattern_policy(),
        SweepPolicy::ByAge(Duration::from_secs(3600)),
    )
    .sweep();

    assert_eq!(report.removed.len(), 2);
    assert_eq!(remaining(dir.path()), vec!["app-3.tgz"]);
}

#[test]
fn test_age_keeps_recent_archives() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "app-1.tgz", 10);
    touch(dir.path(), "app-2.tgz", 20);

    let report = Sweeper::new(
        dir.path(),
        pattern_policy(),
        SweepPolicy::ByAge(Duration::from_secs(7 * 24 * 3600)),
    )
    .sweep();

    assert!(report.removed.is_empty());
    assert_eq!(remaining(dir.path()).len(), 2);
}

#[test]
fn test_missing_directory_is_empty_sweep() {
    let dir = TempDir::new().unwrap();
    let report = Sweeper::new(
        dir.path().join("missing"),
        pattern_policy(),
        SweepPolicy::ByCount(1),
    )
    .sweep();

    assert!(report.removed.is_empty());
    assert!(report.failures.is_empty());
}
