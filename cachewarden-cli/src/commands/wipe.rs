//! Wipe command: delete every recognized file in the watched directories.

use cachewarden::config::CacheConfig;
use cachewarden::eviction;
use cachewarden::size::format_size_approx;
use cachewarden::usage::UsageTracker;

use crate::error::CliError;

/// Wipe all recognized files after confirmation.
pub fn run(config: &CacheConfig, confirmed: bool) -> Result<(), CliError> {
    if !confirmed {
        return Err(CliError::WipeAborted);
    }

    for dir in &config.watched_dirs {
        println!("Wiping recognized files in: {}", dir.display());
    }

    let usage = UsageTracker::new();
    let summary = eviction::wipe_all(config, &usage);

    println!(
        "Deleted {} files, freed {}",
        summary.files_deleted,
        format_size_approx(summary.bytes_freed)
    );
    if summary.size_after > 0 {
        println!(
            "Warning: {} could not be removed and remains on disk",
            format_size_approx(summary.size_after)
        );
    }

    Ok(())
}
