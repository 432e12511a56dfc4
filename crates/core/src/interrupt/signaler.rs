//! Signal delivery to the agent process.
//!
//! The agent is spawned as a process-group leader so cancellation reaches
//! any children it spawned itself. Group signaling is not available
//! everywhere, so delivery is behind a capability trait with a group-aware
//! implementation and a single-process fallback, selected once at startup.

use std::sync::Arc;
use thiserror::Error;

/// The two escalation tiers of the cancellation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Ask the process to terminate politely (SIGTERM).
    Graceful,
    /// Kill immediately (SIGKILL).
    Forceful,
}

/// Errors surfaced by signal delivery.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("signal delivery to pid {pid} failed: {reason}")]
    Deliver { pid: u32, reason: String },

    #[error("process signaling is not supported on this platform")]
    Unsupported,
}

/// Capability interface for delivering termination signals.
pub trait ProcessSignaler: Send + Sync {
    fn signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError>;
}

/// Signals the whole process group, falling back to the single pid when
/// group delivery fails (e.g. the leader changed its own group).
#[cfg(unix)]
pub struct GroupSignaler;

#[cfg(unix)]
impl ProcessSignaler for GroupSignaler {
    fn signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError> {
        use nix::sys::signal::{kill, killpg, Signal};
        use nix::unistd::Pid;

        let signal = match kind {
            SignalKind::Graceful => Signal::SIGTERM,
            SignalKind::Forceful => Signal::SIGKILL,
        };
        let target = Pid::from_raw(pid as i32);

        killpg(target, signal)
            .or_else(|_| kill(target, signal))
            .map_err(|errno| SignalError::Deliver {
                pid,
                reason: errno.to_string(),
            })
    }
}

/// Signals only the spawned process itself.
#[cfg(unix)]
pub struct DirectSignaler;

#[cfg(unix)]
impl ProcessSignaler for DirectSignaler {
    fn signal(&self, pid: u32, kind: SignalKind) -> Result<(), SignalError> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let signal = match kind {
            SignalKind::Graceful => Signal::SIGTERM,
            SignalKind::Forceful => Signal::SIGKILL,
        };

        kill(Pid::from_raw(pid as i32), signal).map_err(|errno| SignalError::Deliver {
            pid,
            reason: errno.to_string(),
        })
    }
}

/// Stub for platforms without signal support; every delivery fails.
#[cfg(not(unix))]
pub struct UnsupportedSignaler;

#[cfg(not(unix))]
impl ProcessSignaler for UnsupportedSignaler {
    fn signal(&self, _pid: u32, _kind: SignalKind) -> Result<(), SignalError> {
        Err(SignalError::Unsupported)
    }
}

/// Select the signaling capability for this platform.
pub fn detect_signaler() -> Arc<dyn ProcessSignaler> {
    #[cfg(unix)]
    {
        Arc::new(GroupSignaler)
    }
    #[cfg(not(unix))]
    {
        Arc::new(UnsupportedSignaler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_signal_to_dead_pid_reports_failure() {
        // Pid values this large are rejected by the kernel
        let result = DirectSignaler.signal(u32::MAX / 2, SignalKind::Graceful);
        assert!(result.is_err());

        let result = GroupSignaler.signal(u32::MAX / 2, SignalKind::Graceful);
        assert!(result.is_err());
    }

    #[test]
    fn test_detect_returns_a_signaler() {
        // Smoke test: selection itself never fails
        let _signaler = detect_signaler();
    }
}
