//! Once-per-run progress announcements shared by concurrent pipelines.
//!
//! Each [`Stage`] has one flag. [`StatusGate::announce_once`] reads the flag
//! without locking; only callers that still see it unset take the lock,
//! re-check, set it, and run the announcement while holding the lock. After the
//! first announcement of a stage every later call returns without touching the
//! lock.
//!
//! A gate is created per orchestration run and dropped with it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::Stage;
use crate::metrics::METRICS;

#[derive(Debug, Default)]
pub struct StatusGate {
    announced: [AtomicBool; 3],
    lock: Mutex<()>,
}

impl StatusGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` if no caller has announced `stage` on this gate yet.
    ///
    /// Returns `Ok(true)` when this call performed the announcement. The flag is
    /// set before `action` runs, so a failing action is not retried by later
    /// callers; its error is returned to this caller.
    pub async fn announce_once<F, Fut, E>(&self, stage: Stage, action: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let flag = &self.announced[stage.index()];
        if flag.load(Ordering::Acquire) {
            return Ok(false);
        }

        let _guard = self.lock.lock().await;
        if flag.load(Ordering::Acquire) {
            return Ok(false);
        }
        flag.store(true, Ordering::Release);
        debug!(stage = %stage, "announcing stage");
        METRICS.inc_announcements();
        action().await?;
        Ok(true)
    }

    pub fn is_announced(&self, stage: Stage) -> bool {
        self.announced[stage.index()].load(Ordering::Acquire)
    }
}
