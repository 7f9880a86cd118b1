//! Debounced scheduling of eviction passes.
//!
//! The scheduler decides *when* a pass runs; the [`eviction`](crate::eviction)
//! module decides *what* the pass does. Two entry points submit work: the
//! debounce timer that follows a write burst, and the manual trigger. Both
//! go through the same single-pass guard, so at most one pass is ever in
//! flight and contention is answered with [`CleanOutcome::Busy`] rather
//! than queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, ConfigHandle};
use crate::eviction::{self, PassSummary};
use crate::usage::UsageTracker;

/// Result of asking for a cleaning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    /// A pass was started on a background task.
    Started,
    /// A pass is already in flight; the request was dropped. This is a
    /// routine outcome, not an error.
    Busy,
}

/// Mutual-exclusion guard for the single in-flight pass.
///
/// `try_acquire` never blocks; it answers false immediately when the guard
/// is already held.
#[derive(Debug, Default)]
pub struct CleaningGuard {
    cleaning: AtomicBool,
}

impl CleaningGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to take the guard. Returns false if already held.
    pub fn try_acquire(&self) -> bool {
        self.cleaning
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the guard.
    pub fn release(&self) {
        self.cleaning.store(false, Ordering::Release);
    }

    /// Whether a pass is currently in flight.
    pub fn is_held(&self) -> bool {
        self.cleaning.load(Ordering::Acquire)
    }
}

type CleaningListener = Box<dyn Fn(bool) + Send + Sync>;

#[derive(Clone, Copy)]
enum PassKind {
    Evict,
    Wipe,
}

/// Schedules eviction passes behind a debounce window.
///
/// External producers report write activity through
/// [`write_burst_started`](Self::write_burst_started) and
/// [`write_burst_finished`](Self::write_burst_finished); the scheduler runs
/// one pass after activity has been quiet for the configured debounce
/// delay. Manual triggers bypass the timer but share the same guard.
///
/// Cloning is cheap (shared state behind an `Arc`); independent instances
/// can coexist, there is no global state.
#[derive(Clone)]
pub struct EvictionScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    config: ConfigHandle,
    usage: Arc<UsageTracker>,
    guard: CleaningGuard,
    /// Single slot for the pending debounce timer. Starting a new timer
    /// cancels and replaces whatever was there.
    pending: Mutex<Option<CancellationToken>>,
    listener: Mutex<Option<CleaningListener>>,
}

impl EvictionScheduler {
    /// Create a scheduler over shared configuration and usage tracking.
    pub fn new(config: ConfigHandle, usage: Arc<UsageTracker>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                usage,
                guard: CleaningGuard::new(),
                pending: Mutex::new(None),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Register the cleaning-state listener (e.g. to disable UI controls
    /// while a pass runs), replacing any previous one.
    pub fn on_cleaning_changed(&self, listener: impl Fn(bool) + Send + Sync + 'static) {
        *self.inner.listener.lock().unwrap() = Some(Box::new(listener));
    }

    /// Whether a pass is currently in flight.
    pub fn is_cleaning(&self) -> bool {
        self.inner.guard.is_held()
    }

    /// New files have started arriving in the watched directories.
    ///
    /// Cancels any pending debounce timer: there is no point cleaning
    /// while the cache is actively growing. A pass already in flight is
    /// never cancelled.
    pub fn write_burst_started(&self) {
        if let Some(token) = self.inner.pending.lock().unwrap().take() {
            token.cancel();
            debug!("Write burst started, pending cleaning timer cancelled");
        }
    }

    /// Write activity has ended; start (or restart) the debounce timer.
    ///
    /// Repeated calls within the window keep pushing the deadline out.
    /// When the timer fires it attempts the guard; if a manual pass beat
    /// it there, the scheduled pass is dropped since that pass already
    /// addressed the same condition.
    pub fn write_burst_finished(&self) {
        let token = CancellationToken::new();
        {
            let mut pending = self.inner.pending.lock().unwrap();
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }

        let debounce = self.inner.config.get().debounce;
        debug!(debounce_ms = debounce.as_millis() as u64, "Cleaning timer armed");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = token.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            // A cancellation racing the timer expiry must not start a pass.
            if token.is_cancelled() {
                return;
            }

            if !inner.guard.try_acquire() {
                debug!("Scheduled cleaning dropped, a pass is already in flight");
                return;
            }
            inner.run_guarded(PassKind::Evict).await;
        });
    }

    /// Run a cleaning pass now, bypassing the debounce timer.
    ///
    /// Non-blocking: if a pass is already in flight the request is a
    /// logged no-op and `Busy` is returned.
    pub fn start_manual_clean(&self) -> CleanOutcome {
        if !self.inner.guard.try_acquire() {
            info!("Cleaning already in progress, manual request ignored");
            return CleanOutcome::Busy;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_guarded(PassKind::Evict).await;
        });
        CleanOutcome::Started
    }

    /// Delete every recognized file in every watched directory.
    ///
    /// Cancels any pending timer first and shares the single-pass guard
    /// with normal cleaning.
    pub fn clear_all(&self) -> CleanOutcome {
        self.write_burst_started();

        if !self.inner.guard.try_acquire() {
            info!("Cleaning already in progress, clear-all request ignored");
            return CleanOutcome::Busy;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_guarded(PassKind::Wipe).await;
        });
        CleanOutcome::Started
    }

    /// Replace the configuration at runtime.
    ///
    /// Lowering the maximum size triggers a manual pass so the new budget
    /// takes effect immediately rather than on the next write burst.
    pub fn apply_config(&self, config: CacheConfig) {
        let new_max = config.max_size_bytes;
        let previous_max = self.inner.config.set(config);

        if new_max < previous_max {
            info!(
                previous_max_bytes = previous_max,
                new_max_bytes = new_max,
                "Maximum cache size lowered, starting cleaning pass"
            );
            let _ = self.start_manual_clean();
        }
    }
}

impl Inner {
    /// Run one pass while holding the guard, releasing it on every exit
    /// path so a failing pass can never wedge the scheduler.
    async fn run_guarded(&self, kind: PassKind) {
        self.notify_cleaning(true);

        let config = self.config.get();
        let usage = Arc::clone(&self.usage);
        let result = tokio::task::spawn_blocking(move || -> PassSummary {
            match kind {
                PassKind::Evict => eviction::run_pass(&config, &usage),
                PassKind::Wipe => eviction::wipe_all(&config, &usage),
            }
        })
        .await;

        if let Err(e) = result {
            warn!(error = %e, "Cleaning pass task failed");
        }

        self.guard.release();
        self.notify_cleaning(false);
    }

    fn notify_cleaning(&self, cleaning: bool) {
        if let Some(listener) = self.listener.lock().unwrap().as_ref() {
            listener(cleaning);
        }
    }
}

impl std::fmt::Debug for EvictionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvictionScheduler")
            .field("cleaning", &self.inner.guard.is_held())
            .finish()
    }
}
