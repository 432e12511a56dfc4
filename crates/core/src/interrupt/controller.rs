//! Interrupt state machine for a single run.
//!
//! Phases progress `Idle -> Requested -> GracefulSent -> (Terminated |
//! ForcefulSent) -> Terminated`. Only `Idle` (no trace present) accepts a
//! new request; a repeated request is answered with `AlreadyRequested` and
//! sends nothing. Escalation to the forceful signal happens only if the
//! process outlives the grace window; natural exit always cancels it.

use crate::interrupt::signaler::{ProcessSignaler, SignalError, SignalKind};
use chrono::{DateTime, Utc};
use rk_protocol::InterruptReply;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Where an interrupt attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptPhase {
    Requested,
    GracefulSent,
    ForcefulSent,
    Terminated,
}

/// Timestamps of one interrupt attempt, kept for post-run diagnostics and
/// discarded at finalization.
#[derive(Debug, Clone)]
pub struct InterruptTrace {
    pub requested_at: DateTime<Utc>,
    pub graceful_at: Option<DateTime<Utc>>,
    pub forceful_at: Option<DateTime<Utc>>,
    pub force_after_ms: u64,
    pub phase: InterruptPhase,
}

/// Errors reported back to the interrupt caller.
#[derive(Error, Debug)]
pub enum InterruptError {
    #[error("no run is active for this endpoint")]
    NotRunning,

    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Drives the interrupt protocol against a running agent process.
///
/// The controller itself is stateless across runs; the per-run
/// [`InterruptTrace`] lives in the endpoint state owned by the orchestrator.
pub struct InterruptController {
    signaler: Arc<dyn ProcessSignaler>,
    force_after: Duration,
}

impl InterruptController {
    pub fn new(signaler: Arc<dyn ProcessSignaler>, force_after: Duration) -> Self {
        Self {
            signaler,
            force_after,
        }
    }

    /// The grace window between the graceful and forceful signals.
    pub fn force_after(&self) -> Duration {
        self.force_after
    }

    /// Request cancellation of the process with the given pid.
    ///
    /// Sends the graceful signal and records the trace. A request while a
    /// trace already exists answers `AlreadyRequested` without signaling
    /// again. A delivery failure (e.g. the process is already gone) is
    /// reported to the caller and leaves no trace behind; the run continues
    /// toward its natural terminal outcome.
    pub fn request(
        &self,
        pid: u32,
        trace: &mut Option<InterruptTrace>,
    ) -> Result<InterruptReply, InterruptError> {
        if trace.is_some() {
            return Ok(InterruptReply::AlreadyRequested);
        }

        let requested_at = Utc::now();
        self.signaler.signal(pid, SignalKind::Graceful)?;

        *trace = Some(InterruptTrace {
            requested_at,
            graceful_at: Some(Utc::now()),
            forceful_at: None,
            force_after_ms: self.force_after.as_millis() as u64,
            phase: InterruptPhase::GracefulSent,
        });

        Ok(InterruptReply::Requested)
    }

    /// Fire the forceful tier after the grace window expired.
    ///
    /// Idempotent with natural process exit: once the trace left
    /// `GracefulSent` this does nothing.
    pub fn escalate(&self, pid: u32, trace: &mut Option<InterruptTrace>) {
        let Some(t) = trace.as_mut() else {
            return;
        };
        if t.phase != InterruptPhase::GracefulSent {
            return;
        }

        if let Err(e) = self.signaler.signal(pid, SignalKind::Forceful) {
            tracing::warn!(pid, error = %e, "forceful signal delivery failed");
        }
        t.forceful_at = Some(Utc::now());
        t.phase = InterruptPhase::ForcefulSent;
    }

    /// Record that the process terminated; cancels any pending escalation.
    pub fn mark_terminated(&self, trace: &mut Option<InterruptTrace>) {
        if let Some(t) = trace.as_mut() {
            t.phase = InterruptPhase::Terminated;
        }
    }
}
