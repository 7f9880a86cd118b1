//! Configuration for the cache keeper.
//!
//! A [`CacheConfig`] names the directories to watch, the file extensions
//! that count as cache entries, and the size budget. Configuration is
//! runtime-mutable through a shared [`ConfigHandle`] so a settings change
//! (e.g. the user lowering the maximum size) takes effect on the next pass.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::error;

/// Default maximum cache size (20 GB).
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 20 * 1024 * 1024 * 1024;

/// Default delay between the end of a write burst and the eviction pass.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(30);

/// Configuration for a watched cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directories scanned for cache entries (top level only, in order).
    /// Directories that do not exist are skipped at scan time.
    pub watched_dirs: Vec<PathBuf>,

    /// File extensions that count as cache entries, stored without the
    /// leading dot. Matching is case-sensitive.
    pub extensions: Vec<String>,

    /// Maximum total size in bytes across all watched directories.
    pub max_size_bytes: u64,

    /// Debounce delay applied after a write burst ends.
    pub debounce: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            watched_dirs: vec![default_root()],
            extensions: Vec::new(),
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl CacheConfig {
    /// Create a configuration watching a single root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            watched_dirs: vec![root.into()],
            ..Self::default()
        }
    }

    /// Add another watched directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.watched_dirs.push(dir.into());
        self
    }

    /// Add a recognized extension. A leading dot is accepted and stripped,
    /// so `"cvravatar"` and `".cvravatar"` are equivalent.
    pub fn with_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.extensions
            .push(ext.as_ref().trim_start_matches('.').to_string());
        self
    }

    /// Set the maximum size in bytes.
    pub fn with_max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    /// Set the maximum size from a user-facing gigabyte setting.
    pub fn with_max_size_gb(mut self, gb: u64) -> Self {
        self.max_size_bytes = gb * 1024 * 1024 * 1024;
        self
    }

    /// Set the debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Ensure the primary watched directory exists.
    ///
    /// If it cannot be created, falls back to the platform default cache
    /// directory and logs the failure loudly. The returned configuration
    /// always names a usable root; initialization never stops halfway.
    pub fn ensure_root(mut self) -> Self {
        let root = match self.watched_dirs.first() {
            Some(dir) => dir.clone(),
            None => default_root(),
        };

        let root = match fs::create_dir_all(&root) {
            Ok(()) => root,
            Err(e) => {
                let fallback = default_root();
                error!(
                    dir = %root.display(),
                    error = %e,
                    fallback = %fallback.display(),
                    "Cannot create cache root, falling back to default directory"
                );
                if let Err(e) = fs::create_dir_all(&fallback) {
                    error!(
                        dir = %fallback.display(),
                        error = %e,
                        "Cannot create fallback cache directory"
                    );
                }
                fallback
            }
        };

        if self.watched_dirs.is_empty() {
            self.watched_dirs.push(root);
        } else {
            self.watched_dirs[0] = root;
        }
        self
    }
}

/// Platform default cache root (`<cache_dir>/cachewarden`).
pub fn default_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cachewarden")
}

/// Shared, runtime-mutable handle to a [`CacheConfig`].
///
/// The scheduler reads through this handle at the start of every pass, so
/// configuration changes never require restarting the engine.
#[derive(Debug, Clone)]
pub struct ConfigHandle(Arc<RwLock<CacheConfig>>);

impl ConfigHandle {
    /// Wrap a configuration in a shared handle.
    pub fn new(config: CacheConfig) -> Self {
        Self(Arc::new(RwLock::new(config)))
    }

    /// Snapshot the current configuration.
    pub fn get(&self) -> CacheConfig {
        self.0.read().unwrap().clone()
    }

    /// Replace the configuration, returning the previous maximum size.
    pub fn set(&self, config: CacheConfig) -> u64 {
        let mut guard = self.0.write().unwrap();
        let previous_max = guard.max_size_bytes;
        *guard = config;
        previous_max
    }

    /// Current maximum size in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.0.read().unwrap().max_size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size_bytes, 20 * 1024 * 1024 * 1024);
        assert_eq!(config.debounce, Duration::from_secs(30));
        assert!(config.extensions.is_empty());
        assert_eq!(config.watched_dirs.len(), 1);
        assert!(config.watched_dirs[0].ends_with("cachewarden"));
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new("/tmp/cache")
            .with_dir("/tmp/cache2")
            .with_extension("cvravatar")
            .with_max_size_gb(2)
            .with_debounce(Duration::from_secs(5));

        assert_eq!(config.watched_dirs.len(), 2);
        assert_eq!(config.extensions, vec!["cvravatar".to_string()]);
        assert_eq!(config.max_size_bytes, 2 * 1024 * 1024 * 1024);
        assert_eq!(config.debounce, Duration::from_secs(5));
    }

    #[test]
    fn test_extension_leading_dot_stripped() {
        let config = CacheConfig::new("/tmp/cache").with_extension(".cvravatar");
        assert_eq!(config.extensions, vec!["cvravatar".to_string()]);
    }

    #[test]
    fn test_ensure_root_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested/cache");

        let config = CacheConfig::new(&root).ensure_root();

        assert!(root.is_dir());
        assert_eq!(config.watched_dirs[0], root);
    }

    #[test]
    fn test_config_handle_snapshot_and_replace() {
        let handle = ConfigHandle::new(CacheConfig::new("/tmp/a").with_max_size_bytes(100));
        assert_eq!(handle.max_size_bytes(), 100);

        let previous = handle.set(CacheConfig::new("/tmp/a").with_max_size_bytes(50));
        assert_eq!(previous, 100);
        assert_eq!(handle.max_size_bytes(), 50);
        assert_eq!(handle.get().watched_dirs[0], PathBuf::from("/tmp/a"));
    }
}
