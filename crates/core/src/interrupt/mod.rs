//! Two-phase run cancellation.
//!
//! An interrupt first delivers a graceful termination signal and, if the
//! process outlives the grace window, escalates to a forceful kill:
//! - [`signaler`]: signal delivery capability (process group or single pid)
//! - [`controller`]: the per-run interrupt state machine and trace record

pub mod controller;
pub mod signaler;

pub use controller::{InterruptController, InterruptError, InterruptPhase, InterruptTrace};
pub use signaler::{detect_signaler, ProcessSignaler, SignalError, SignalKind};
