//! Status command: measure and report cache usage.

use cachewarden::config::CacheConfig;
use cachewarden::eviction;
use cachewarden::size::format_size_approx;

use crate::error::CliError;

/// Scan the watched directories and print usage against the budget.
pub fn run(config: &CacheConfig) -> Result<(), CliError> {
    let records = eviction::scan(config);
    let total: u64 = records.iter().map(|r| r.size_bytes).sum();

    for dir in &config.watched_dirs {
        println!("Watching: {}", dir.display());
    }
    println!("  Entries: {}", records.len());
    println!(
        "  Size:    {} of {} ({:.0}%)",
        format_size_approx(total),
        format_size_approx(config.max_size_bytes),
        percent(total, config.max_size_bytes)
    );

    Ok(())
}

fn percent(current: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        current as f64 / max as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 100), 50.0);
        assert_eq!(percent(0, 100), 0.0);
        assert_eq!(percent(10, 0), 0.0);
    }
}
