//! Explicit access-time updates for cached files.
//!
//! Eviction orders files by last access time, but many platforms disable
//! automatic atime updates for performance. Any consumer that reads or
//! reuses a cached file must therefore call [`touch`] at the point of use,
//! otherwise a frequently-reused file looks stale and becomes an eviction
//! target purely due to old metadata.

use std::io;
use std::path::Path;

use filetime::FileTime;

/// Force a file's access time forward to now.
///
/// # Errors
///
/// Returns the underlying I/O error if the file does not exist or the
/// timestamp cannot be written.
pub fn touch(path: &Path) -> io::Result<()> {
    filetime::set_file_atime(path, FileTime::now())
}
