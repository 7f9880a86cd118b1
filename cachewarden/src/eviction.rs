//! The eviction pass: scan, account, delete oldest-accessed first.
//!
//! Every pass rebuilds its view of the cache from filesystem metadata.
//! Nothing is persisted between passes, so the watched directories may be
//! modified by the user or any other process without corrupting anything;
//! the cost is an O(n) directory scan per pass, which is fine because
//! passes are debounced or user-triggered, not per-file.

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::usage::UsageTracker;

/// Fraction of the maximum size a pass cleans down to (0.8 = 80%).
/// The 20% band of hysteresis keeps a single new file from triggering
/// another pass immediately after the previous one finished.
pub const CLEAN_TARGET_RATIO: f64 = 0.8;

/// One cache entry as seen during a pass. Rebuilt fresh every scan,
/// never cached across passes.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last access time, falling back to mtime where atime is unavailable.
    pub accessed: SystemTime,
}

/// Outcome of one eviction or wipe pass.
#[derive(Debug, Clone, Default)]
pub struct PassSummary {
    /// Number of candidate files found by the scan.
    pub candidates: usize,
    /// Number of files deleted.
    pub files_deleted: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Cache size before the pass.
    pub size_before: u64,
    /// Cache size after the pass.
    pub size_after: u64,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
}

/// Collect all cache entries under the watched directories.
///
/// Enumeration is top-level only; subdirectories are not descended into.
/// Directories that do not exist, or disappear between the existence check
/// and enumeration, contribute zero candidates rather than an error.
pub fn scan(config: &CacheConfig) -> Vec<FileRecord> {
    let mut records = Vec::new();

    for dir in &config.watched_dirs {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Watched directory missing, skipping");
            continue;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    dir = %dir.display(),
                    error = %e,
                    "Failed to read watched directory, skipping"
                );
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !matches_extension(&path, &config.extensions) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let accessed = metadata
                .accessed()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            records.push(FileRecord {
                path,
                size_bytes: metadata.len(),
                accessed,
            });
        }
    }

    records
}

/// Case-sensitive extension match against the recognized set.
fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => extensions.iter().any(|want| want == ext),
        None => false,
    }
}

/// Rescan the watched directories and publish the total size.
///
/// Used at startup (the tracker starts out unknown) and after operations
/// that change the directory contents outside a normal pass.
pub fn scan_usage(config: &CacheConfig, usage: &UsageTracker) -> u64 {
    let total: u64 = scan(config).iter().map(|r| r.size_bytes).sum();
    usage.set(total as i64);
    total
}

/// Run one eviction pass.
///
/// If the cache is within budget the pass only publishes the measured size.
/// Otherwise files are deleted in ascending last-access order (ties broken
/// by path) until the total is at or below `CLEAN_TARGET_RATIO` of the
/// maximum, or the candidates run out. The first failed deletion aborts
/// the remainder of the pass; partial progress is kept and published.
pub fn run_pass(config: &CacheConfig, usage: &UsageTracker) -> PassSummary {
    let start = Instant::now();
    let mut candidates = scan(config);
    let candidate_count = candidates.len();
    let current_size: u64 = candidates.iter().map(|r| r.size_bytes).sum();

    if current_size <= config.max_size_bytes {
        usage.set(current_size as i64);
        debug!(
            size_bytes = current_size,
            limit_bytes = config.max_size_bytes,
            "Cache within budget, no eviction needed"
        );
        return PassSummary {
            candidates: candidate_count,
            size_before: current_size,
            size_after: current_size,
            duration_ms: start.elapsed().as_millis() as u64,
            ..Default::default()
        };
    }

    let target_size = (config.max_size_bytes as f64 * CLEAN_TARGET_RATIO) as u64;

    info!(
        current_size_bytes = current_size,
        limit_bytes = config.max_size_bytes,
        target_bytes = target_size,
        candidates = candidate_count,
        "Cache over budget, starting eviction"
    );

    candidates.sort_by(|a, b| a.accessed.cmp(&b.accessed).then_with(|| a.path.cmp(&b.path)));

    let (files_deleted, bytes_freed, remaining_size) =
        delete_until(&candidates, current_size, target_size);

    usage.set(remaining_size as i64);

    let summary = PassSummary {
        candidates: candidate_count,
        files_deleted,
        bytes_freed,
        size_before: current_size,
        size_after: remaining_size,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    log_summary(&summary);
    summary
}

/// Delete candidates in order until `remaining <= target` or the list is
/// exhausted. Candidates must already be sorted oldest-accessed first.
///
/// A failed deletion (file locked, permission denied) stops the loop
/// immediately; a later pass will retry with fresh metadata.
fn delete_until(candidates: &[FileRecord], current_size: u64, target_size: u64) -> (usize, u64, u64) {
    let mut remaining_size = current_size;
    let mut files_deleted = 0usize;
    let mut bytes_freed = 0u64;

    for record in candidates {
        if remaining_size <= target_size {
            break;
        }

        match std::fs::remove_file(&record.path) {
            Ok(()) => {
                bytes_freed += record.size_bytes;
                remaining_size = remaining_size.saturating_sub(record.size_bytes);
                files_deleted += 1;
                debug!(
                    path = %record.path.display(),
                    size_bytes = record.size_bytes,
                    "Evicted cache file"
                );
            }
            Err(e) => {
                warn!(
                    path = %record.path.display(),
                    error = %e,
                    "Failed to delete cache file, stopping this pass early"
                );
                break;
            }
        }
    }

    (files_deleted, bytes_freed, remaining_size)
}

/// Delete every recognized file in every watched directory, then publish
/// a size of zero.
///
/// Like a normal pass, the first failed deletion stops the wipe; in that
/// case the published size comes from a fresh rescan instead of zero.
pub fn wipe_all(config: &CacheConfig, usage: &UsageTracker) -> PassSummary {
    let start = Instant::now();
    let candidates = scan(config);
    let size_before: u64 = candidates.iter().map(|r| r.size_bytes).sum();

    let mut files_deleted = 0usize;
    let mut bytes_freed = 0u64;
    let mut aborted = false;

    for record in &candidates {
        match std::fs::remove_file(&record.path) {
            Ok(()) => {
                bytes_freed += record.size_bytes;
                files_deleted += 1;
            }
            Err(e) => {
                warn!(
                    path = %record.path.display(),
                    error = %e,
                    "Failed to delete cache file during wipe, stopping early"
                );
                aborted = true;
                break;
            }
        }
    }

    let size_after = if aborted {
        scan_usage(config, usage)
    } else {
        usage.set(0);
        0
    };

    let summary = PassSummary {
        candidates: candidates.len(),
        files_deleted,
        bytes_freed,
        size_before,
        size_after,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    log_summary(&summary);
    summary
}

fn log_summary(summary: &PassSummary) {
    info!(
        candidates = summary.candidates,
        files_deleted = summary.files_deleted,
        bytes_freed = summary.bytes_freed,
        size_before = summary.size_before,
        size_after = summary.size_after,
        duration_ms = summary.duration_ms,
        "Cache pass complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::SIZE_UNKNOWN;
    use filetime::FileTime;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Create a cache file with a specific size and access time
    /// (seconds after the Unix epoch, so ordering is exact).
    fn create_test_file(path: &Path, size: usize, atime_secs: u64) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, vec![0u8; size]).unwrap();

        let atime = FileTime::from_unix_time(atime_secs as i64, 0);
        filetime::set_file_times(path, atime, atime).unwrap();
    }

    fn test_config(root: &Path, max_size_bytes: u64) -> CacheConfig {
        CacheConfig::new(root)
            .with_extension("cvravatar")
            .with_max_size_bytes(max_size_bytes)
    }

    #[test]
    fn test_scan_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(temp_dir.path(), 100);
        assert!(scan(&config).is_empty());
    }

    #[test]
    fn test_scan_missing_dir_is_not_an_error() {
        let config = test_config(Path::new("/nonexistent/cachewarden-test"), 100);
        assert!(scan(&config).is_empty());
    }

    #[test]
    fn test_scan_filters_extensions_and_subdirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        create_test_file(&root.join("a.cvravatar"), 10, 1);
        create_test_file(&root.join("b.txt"), 10, 1);
        create_test_file(&root.join("noext"), 10, 1);
        // Files in subdirectories must not be counted (top-level only).
        create_test_file(&root.join("sub/c.cvravatar"), 10, 1);

        let config = test_config(root, 100);
        let records = scan(&config);
        assert_eq!(records.len(), 1);
        assert!(records[0].path.ends_with("a.cvravatar"));
    }

    #[test]
    fn test_scan_extension_match_is_case_sensitive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(&root.join("a.CVRAVATAR"), 10, 1);

        let config = test_config(root, 100);
        assert!(scan(&config).is_empty());
    }

    #[test]
    fn test_scan_multiple_dirs_in_order() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        create_test_file(&temp_a.path().join("a.cvravatar"), 30, 1);
        create_test_file(&temp_b.path().join("b.cvravatar"), 40, 2);

        let config = test_config(temp_a.path(), 100).with_dir(temp_b.path());
        let records = scan(&config);
        assert_eq!(records.len(), 2);
        let total: u64 = records.iter().map(|r| r.size_bytes).sum();
        assert_eq!(total, 70);
    }

    #[test]
    fn test_scan_usage_publishes_total() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(&root.join("a.cvravatar"), 30, 1);
        create_test_file(&root.join("b.cvravatar"), 40, 2);

        let usage = UsageTracker::new();
        assert_eq!(usage.get(), SIZE_UNKNOWN);

        let total = scan_usage(&test_config(root, 1000), &usage);
        assert_eq!(total, 70);
        assert_eq!(usage.get(), 70);
    }

    #[test]
    fn test_pass_under_budget_deletes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(&root.join("a.cvravatar"), 50, 1);

        let config = test_config(root, 100);
        let usage = UsageTracker::new();

        let summary = run_pass(&config, &usage);
        assert_eq!(summary.files_deleted, 0);
        assert_eq!(summary.size_after, 50);
        assert_eq!(usage.get(), 50);
        assert!(root.join("a.cvravatar").exists());

        // Second consecutive run: still nothing to do, size unchanged.
        let summary = run_pass(&config, &usage);
        assert_eq!(summary.files_deleted, 0);
        assert_eq!(usage.get(), 50);
    }

    #[test]
    fn test_pass_converges_to_target() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        for i in 0..10 {
            create_test_file(&root.join(format!("f{}.cvravatar", i)), 20, i + 1);
        }

        // Total 200 > 100; target is 80.
        let config = test_config(root, 100);
        let usage = UsageTracker::new();

        let summary = run_pass(&config, &usage);
        assert!(summary.size_after <= 80);
        assert_eq!(summary.size_after, 80);
        assert_eq!(summary.files_deleted, 6);
        assert_eq!(usage.get(), 80);
    }

    #[test]
    fn test_pass_deletes_oldest_accessed_first() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        // Sizes deliberately shuffled against age: ordering must follow
        // access time only.
        create_test_file(&root.join("oldest.cvravatar"), 10, 100);
        create_test_file(&root.join("middle.cvravatar"), 500, 200);
        create_test_file(&root.join("newest.cvravatar"), 10, 300);

        // Total 520 > 200; target 160. Deleting oldest (10) then middle
        // (500) reaches 10 <= 160.
        let config = test_config(root, 200);
        let usage = UsageTracker::new();

        let summary = run_pass(&config, &usage);
        assert_eq!(summary.files_deleted, 2);
        assert!(!root.join("oldest.cvravatar").exists());
        assert!(!root.join("middle.cvravatar").exists());
        assert!(root.join("newest.cvravatar").exists());
        assert_eq!(usage.get(), 10);
    }

    #[test]
    fn test_pass_tie_broken_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        create_test_file(&root.join("bbb.cvravatar"), 60, 100);
        create_test_file(&root.join("aaa.cvravatar"), 60, 100);

        // Total 120 > 100; target 80. One deletion suffices and it must
        // be the lexicographically first path.
        let config = test_config(root, 100);
        let usage = UsageTracker::new();

        let summary = run_pass(&config, &usage);
        assert_eq!(summary.files_deleted, 1);
        assert!(!root.join("aaa.cvravatar").exists());
        assert!(root.join("bbb.cvravatar").exists());
    }

    #[test]
    fn test_concrete_scenario_single_deletion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        create_test_file(&root.join("a.cvravatar"), 50, 1);
        create_test_file(&root.join("b.cvravatar"), 40, 2);
        create_test_file(&root.join("c.cvravatar"), 30, 3);

        // Total 120 > 100; target 80. Deleting A leaves 70 <= 80: stop.
        let config = test_config(root, 100);
        let usage = UsageTracker::new();

        let summary = run_pass(&config, &usage);
        assert_eq!(summary.files_deleted, 1);
        assert_eq!(summary.bytes_freed, 50);
        assert_eq!(summary.size_after, 70);
        assert!(!root.join("a.cvravatar").exists());
        assert!(root.join("b.cvravatar").exists());
        assert!(root.join("c.cvravatar").exists());
        assert_eq!(usage.get(), 70);
    }

    #[test]
    fn test_concrete_scenario_exhaustion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        create_test_file(&root.join("a.cvravatar"), 200, 1);

        // Single 200-byte file over a 100-byte budget: deleting it empties
        // the cache, which is below the 80-byte target.
        let config = test_config(root, 100);
        let usage = UsageTracker::new();

        let summary = run_pass(&config, &usage);
        assert_eq!(summary.files_deleted, 1);
        assert_eq!(summary.size_after, 0);
        assert_eq!(usage.get(), 0);
    }

    #[test]
    fn test_delete_failure_aborts_remaining_loop() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        // Second candidate is a directory, so remove_file on it fails.
        create_test_file(&root.join("one.cvravatar"), 10, 1);
        std::fs::create_dir(root.join("two.cvravatar.d")).unwrap();
        create_test_file(&root.join("three.cvravatar"), 10, 3);

        let candidates = vec![
            FileRecord {
                path: root.join("one.cvravatar"),
                size_bytes: 10,
                accessed: SystemTime::UNIX_EPOCH + Duration::from_secs(1),
            },
            FileRecord {
                path: root.join("two.cvravatar.d"),
                size_bytes: 10,
                accessed: SystemTime::UNIX_EPOCH + Duration::from_secs(2),
            },
            FileRecord {
                path: root.join("three.cvravatar"),
                size_bytes: 10,
                accessed: SystemTime::UNIX_EPOCH + Duration::from_secs(3),
            },
        ];

        // Needs all three gone to reach target 0; must stop after the
        // failure on the second.
        let (deleted, freed, remaining) = delete_until(&candidates, 30, 0);
        assert_eq!(deleted, 1);
        assert_eq!(freed, 10);
        assert_eq!(remaining, 20);
        assert!(!root.join("one.cvravatar").exists());
        assert!(root.join("three.cvravatar").exists());
    }

    #[test]
    fn test_wipe_all_deletes_everything_and_publishes_zero() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(&root.join("a.cvravatar"), 30, 1);
        create_test_file(&root.join("b.cvravatar"), 40, 2);
        create_test_file(&root.join("keep.txt"), 10, 3);

        let config = test_config(root, 1_000_000);
        let usage = UsageTracker::new();

        let summary = wipe_all(&config, &usage);
        assert_eq!(summary.files_deleted, 2);
        assert_eq!(summary.bytes_freed, 70);
        assert_eq!(summary.size_after, 0);
        assert_eq!(usage.get(), 0);
        assert!(!root.join("a.cvravatar").exists());
        assert!(root.join("keep.txt").exists());
    }

    #[test]
    fn test_pass_summary_default() {
        let summary = PassSummary::default();
        assert_eq!(summary.candidates, 0);
        assert_eq!(summary.files_deleted, 0);
        assert_eq!(summary.bytes_freed, 0);
    }
}
