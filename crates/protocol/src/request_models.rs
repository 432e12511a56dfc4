//! Request submission models.
//!
//! A caller submits a [`RunRequest`] for an endpoint and receives a
//! [`SubmitResult`] telling it whether the run started immediately or was
//! appended to the endpoint's backlog.

use serde::{Deserialize, Serialize};

/// A caller-supplied execution request.
///
/// Queued verbatim while the endpoint is busy; never mutated while waiting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// The conversational instruction to relay to the agent.
    pub prompt: String,

    /// Identity of the requester, for the status panel and logs.
    #[serde(default)]
    pub requested_by: String,

    /// Request the more talkative display cadence for this run.
    #[serde(default)]
    pub verbose: bool,
}

impl RunRequest {
    /// Create a request with just a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            requested_by: String::new(),
            verbose: false,
        }
    }
}

/// Reply to a submission.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmitResult {
    /// The endpoint was idle; the run is starting now.
    Started,

    /// The endpoint is busy; the request waits at the given backlog depth.
    Queued { depth: usize },
}

/// Reply to an interrupt request against a running endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterruptReply {
    /// The graceful signal was sent; escalation is armed.
    Requested,

    /// An interrupt was already in flight; no additional signal was sent.
    AlreadyRequested,
}
