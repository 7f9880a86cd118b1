//! Last-known cache size tracking with change notification.
//!
//! The tracker is the single authoritative value for "how big is the cache
//! right now". Every eviction pass and every rescan publishes through it,
//! and observers (a UI, telemetry) subscribe via [`UsageTracker::on_change`].

use std::sync::Mutex;

/// Sentinel meaning the size has not been computed yet.
pub const SIZE_UNKNOWN: i64 = -1;

type SizeListener = Box<dyn Fn(i64) + Send + Sync>;

/// Thread-safe holder of the last known cache size in bytes.
///
/// Starts at [`SIZE_UNKNOWN`]. Values are not validated here; callers are
/// expected to publish non-negative byte counts (or the sentinel).
pub struct UsageTracker {
    size_bytes: Mutex<i64>,
    listener: Mutex<Option<SizeListener>>,
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageTracker {
    /// Create a tracker with the size not yet known.
    pub fn new() -> Self {
        Self {
            size_bytes: Mutex::new(SIZE_UNKNOWN),
            listener: Mutex::new(None),
        }
    }

    /// Last published size in bytes, or [`SIZE_UNKNOWN`].
    pub fn get(&self) -> i64 {
        *self.size_bytes.lock().unwrap()
    }

    /// Publish a new size and notify the registered listener.
    ///
    /// The listener is advisory (UI refresh, telemetry) and runs on the
    /// caller's thread; it must return promptly.
    pub fn set(&self, new_size: i64) {
        *self.size_bytes.lock().unwrap() = new_size;

        if let Some(listener) = self.listener.lock().unwrap().as_ref() {
            listener(new_size);
        }
    }

    /// Register the size-changed listener, replacing any previous one.
    pub fn on_change(&self, listener: impl Fn(i64) + Send + Sync + 'static) {
        *self.listener.lock().unwrap() = Some(Box::new(listener));
    }
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("size_bytes", &self.get())
            .finish()
    }
}
