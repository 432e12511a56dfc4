//! Typed progress events decoded from the agent's output stream.
//!
//! The external coding agent reports its progress as newline-delimited JSON
//! records on stdout. The event parser in rk-core turns those records into
//! the [`ProgressEvent`] values defined here; everything downstream (the
//! orchestrator, the live display) consumes only these typed events.

use serde::{Deserialize, Serialize};

/// Distinguishes streamed text channels.
///
/// The agent emits intermediate reasoning text while it works and final
/// answer text when it is done; the live preview treats them differently.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    /// Intermediate "thinking out loud" output.
    Reasoning,
    /// Text that belongs to the final answer.
    Final,
}

/// A single progress event observed during a run.
///
/// Events from one stream arrive in emission order. Lines that do not decode
/// as a known record are preserved verbatim (capped) as [`ProgressEvent::RawLine`]
/// so nothing the agent prints is silently lost.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The agent began a new working step.
    StepStarted,

    /// The agent finished its current step.
    StepFinished {
        /// Why the step ended (e.g. "completed", "max_turns").
        reason: String,
    },

    /// A chunk of streamed text.
    TextChunk { content: String, kind: TextKind },

    /// The agent invoked a tool.
    ToolInvoked {
        name: String,
        /// Short human-readable description of the invocation.
        detail: String,
    },

    /// The agent is blocked upstream (e.g. provider rate limiting).
    Waiting {
        status: String,
        /// Best-effort hint in seconds; not a contract.
        retry_after_secs: Option<u64>,
    },

    /// An unparsed or unstructured output line, kept verbatim.
    RawLine { content: String },
}

impl ProgressEvent {
    /// Whether this event represents substantive forward progress.
    ///
    /// Substantive events clear a pending [`ProgressEvent::Waiting`] state;
    /// raw lines and further waiting reports do not.
    pub fn is_substantive(&self) -> bool {
        matches!(
            self,
            ProgressEvent::StepStarted
                | ProgressEvent::StepFinished { .. }
                | ProgressEvent::TextChunk { .. }
                | ProgressEvent::ToolInvoked { .. }
        )
    }
}
