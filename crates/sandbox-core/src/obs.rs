//! Structured observability hooks for sandbox setup.
//!
//! This module provides:
//! - A reservation-scoped span for instrumenting setup futures
//! - Emission functions for provisioning lifecycle events
//!
//! Events are emitted at `info!` level unless noted. For JSON output, start the
//! binary with `--json` (see [`crate::telemetry::init_tracing`]).

use tracing::info;

use crate::domain::{PipelineOutcome, Stage};

/// Reservation-scoped span for async code; attach it with
/// [`tracing::Instrument::instrument`] instead of entering it across `.await`.
///
/// # Example
///
/// ```ignore
/// sequencer.run().instrument(reservation_span("res-12345")).await
/// ```
pub fn reservation_span(reservation_id: &str) -> tracing::Span {
    tracing::info_span!("sandbox.setup", reservation_id = %reservation_id)
}

/// Emit event: provisioning fan-out started.
pub fn emit_provisioning_started(reservation_id: &str, resources: usize) {
    info!(
        event = "provisioning.started",
        reservation_id = %reservation_id,
        resources = resources,
    );
}

/// Emit event: a stage was skipped by resource configuration.
pub fn emit_stage_skipped(reservation_id: &str, resource: &str, stage: Stage) {
    info!(
        event = "stage.skipped",
        reservation_id = %reservation_id,
        resource = %resource,
        stage = %stage,
    );
}

/// Emit event: one resource pipeline reached its terminal state.
pub fn emit_pipeline_finished(reservation_id: &str, outcome: &PipelineOutcome, duration_ms: u64) {
    if outcome.success() {
        info!(
            event = "pipeline.finished",
            reservation_id = %reservation_id,
            resource = %outcome.resource,
            status = ?outcome.status,
            duration_ms = duration_ms,
            success = true,
        );
    } else {
        tracing::warn!(
            event = "pipeline.finished",
            reservation_id = %reservation_id,
            resource = %outcome.resource,
            status = ?outcome.status,
            duration_ms = duration_ms,
            success = false,
            message = %outcome.message,
        );
    }
}

/// Emit event: every pipeline of a run has finished.
pub fn emit_provisioning_finished(reservation_id: &str, succeeded: usize, failed: usize) {
    info!(
        event = "provisioning.finished",
        reservation_id = %reservation_id,
        succeeded = succeeded,
        failed = failed,
    );
}

/// Emit event: one status poll against the deployment server.
pub fn emit_poll_attempt(task: &str, attempt: u32, max_retries: u32, completed: bool) {
    tracing::debug!(
        event = "poll.attempt",
        task = %task,
        attempt = attempt,
        max_retries = max_retries,
        completed = completed,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_span_name() {
        let span = reservation_span("test-reservation");
        if let Some(meta) = span.metadata() {
            assert_eq!(meta.name(), "sandbox.setup");
        }
    }
}
