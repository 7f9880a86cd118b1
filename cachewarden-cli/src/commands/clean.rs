//! Clean command: run one cleaning pass synchronously.

use cachewarden::config::CacheConfig;
use cachewarden::eviction;
use cachewarden::size::format_size_approx;
use cachewarden::usage::UsageTracker;

use crate::error::CliError;

/// Run a single eviction pass and report the outcome.
pub fn run(config: &CacheConfig) -> Result<(), CliError> {
    let usage = UsageTracker::new();
    let summary = eviction::run_pass(config, &usage);

    if summary.files_deleted == 0 {
        println!(
            "Cache within budget: {} of {}, nothing deleted",
            format_size_approx(summary.size_after),
            format_size_approx(config.max_size_bytes)
        );
    } else {
        println!(
            "Deleted {} of {} candidates, freed {} ({} -> {})",
            summary.files_deleted,
            summary.candidates,
            format_size_approx(summary.bytes_freed),
            format_size_approx(summary.size_before),
            format_size_approx(summary.size_after),
        );
    }

    Ok(())
}
