//! Global atomic counters for provisioning observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a setup run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Process-wide atomic counters for provisioning activity.
pub struct Metrics {
    pipelines_run: AtomicU64,
    pipelines_failed: AtomicU64,
    announcements_emitted: AtomicU64,
    polls_issued: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            pipelines_run: AtomicU64::new(0),
            pipelines_failed: AtomicU64::new(0),
            announcements_emitted: AtomicU64::new(0),
            polls_issued: AtomicU64::new(0),
        }
    }

    /// Count one finished resource pipeline.
    pub fn record_pipeline(&self, success: bool) {
        self.pipelines_run.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.pipelines_failed.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "pipelines_run", success, "counter incremented");
    }

    pub fn inc_announcements(&self) {
        self.announcements_emitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "announcements_emitted", "counter incremented");
    }

    pub fn inc_polls(&self) {
        self.polls_issued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "polls_issued", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            pipelines_run = self.pipelines_run(),
            pipelines_failed = self.pipelines_failed(),
            announcements_emitted = self.announcements_emitted(),
            polls_issued = self.polls_issued(),
        );
    }

    pub fn pipelines_run(&self) -> u64 {
        self.pipelines_run.load(Ordering::Relaxed)
    }

    pub fn pipelines_failed(&self) -> u64 {
        self.pipelines_failed.load(Ordering::Relaxed)
    }

    pub fn announcements_emitted(&self) -> u64 {
        self.announcements_emitted.load(Ordering::Relaxed)
    }

    pub fn polls_issued(&self) -> u64 {
        self.polls_issued.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.pipelines_run.store(0, Ordering::Relaxed);
        self.pipelines_failed.store(0, Ordering::Relaxed);
        self.announcements_emitted.store(0, Ordering::Relaxed);
        self.polls_issued.store(0, Ordering::Relaxed);
    }
}
