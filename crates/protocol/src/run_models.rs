//! Run lifecycle models.
//!
//! This module defines the structures describing one execution of the
//! external agent: the phase reported on the status panel while it runs,
//! the terminal outcome delivered by the process supervisor, and the final
//! result resolved by the orchestrator.

use serde::{Deserialize, Serialize};

/// The coarse phase of a run as shown on the status panel.
///
/// The phase progresses Launching -> Running -> Finalizing during normal
/// execution. Waiting is a sub-state of Running entered whenever the most
/// recent event reported the agent as blocked upstream; any substantive
/// event leaves it again.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// The agent process is being spawned.
    Launching,

    /// The agent process is executing.
    Running,

    /// The agent reported itself blocked upstream (e.g. quota).
    Waiting,

    /// The process has terminated; the outcome is being resolved.
    Finalizing,
}

/// Upstream-blocked detail while a run sits in [`RunPhase::Waiting`].
///
/// Set when the agent reports itself blocked (e.g. provider quota); cleared
/// by the next substantive event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WaitingInfo {
    /// The agent's own description of what it is waiting on.
    pub status: String,

    /// Best-effort hint in seconds; not a contract.
    pub retry_after_secs: Option<u64>,
}

/// Best-effort rate-limit detection from the agent's diagnostic output.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitHint {
    /// Parsed retry-after value in seconds, if one could be extracted.
    ///
    /// The agent does not guarantee units; treat as a hint only.
    pub retry_after_secs: Option<u64>,
}

/// Metadata collected over the lifetime of one run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct RunMetadata {
    /// Latest non-empty continuation/session id observed in the stream.
    pub session_id: Option<String>,

    /// Set when stderr matched rate-limit vocabulary; latest detection wins.
    pub rate_limit: Option<RateLimitHint>,

    /// The last few stderr lines, oldest first, for diagnostics.
    pub stderr_tail: Vec<String>,

    /// Accumulated final-answer text, if any was produced.
    pub final_text: Option<String>,
}

/// Terminal result reported by the process supervisor, exactly once per run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Process exit code. `None` when the process was killed on timeout
    /// before reporting one, or never produced one.
    pub exit_code: Option<i32>,

    /// Present iff the run was terminated by the absolute timeout.
    pub timeout: Option<String>,

    /// Everything gathered while the process ran.
    pub metadata: RunMetadata,
}

/// The single user-visible result of a run.
///
/// Finalization resolves every run into exactly one of these; the chat
/// transport delivers it as the run's terminal message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinalOutcome {
    /// The run was cancelled on user request.
    Interrupted,

    /// The run exceeded the maximum allowed duration.
    TimedOut { message: String },

    /// The agent produced final answer text.
    Completed { text: String },

    /// The process exited cleanly but produced no usable text; a
    /// synthesized diagnostic summary stands in for the answer.
    NoOutput { fallback: String },

    /// The run failed before or during execution.
    Errored { message: String },
}
