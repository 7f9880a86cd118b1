//! CacheWarden - size-bounded disk cache keeper for downloaded assets
//!
//! This library keeps a set of watched directories under a configured size
//! budget by deleting the least-recently-accessed files. Eviction runs
//! asynchronously, debounced behind bursts of write activity, and never
//! overlaps with itself.
//!
//! # High-Level API
//!
//! ```ignore
//! use cachewarden::config::{CacheConfig, ConfigHandle};
//! use cachewarden::scheduler::EvictionScheduler;
//! use cachewarden::usage::UsageTracker;
//! use std::sync::Arc;
//!
//! let config = CacheConfig::new("/home/user/.cache/assets")
//!     .with_extension("cvravatar")
//!     .with_max_size_gb(20)
//!     .ensure_root();
//!
//! let usage = Arc::new(UsageTracker::new());
//! let scheduler = EvictionScheduler::new(ConfigHandle::new(config), usage);
//!
//! // Downloader signals write activity; eviction follows after the debounce.
//! scheduler.write_burst_started();
//! // ... files land on disk ...
//! scheduler.write_burst_finished();
//! ```

pub mod config;
pub mod eviction;
pub mod logging;
pub mod scheduler;
pub mod size;
pub mod touch;
pub mod usage;

/// Version of the CacheWarden library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
