//! Outbound display updates toward the chat surface.
//!
//! The core edits two live messages per endpoint while a run executes: a
//! structured status panel and a free-form streaming preview. The chat
//! transport (an external collaborator) receives these as repeated in-place
//! edits rather than new messages.

use serde::{Deserialize, Serialize};

/// The two independently throttled live messages of a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySlot {
    /// Structured status panel: phase, counters, queue depth, backoff detail.
    Panel,

    /// Free-form streaming preview of the latest meaningful text.
    Preview,
}

/// One outbound live-message edit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LiveUpdate {
    /// The endpoint whose live message is being edited.
    pub endpoint_id: String,

    /// Which of the two live messages to edit.
    pub slot: DisplaySlot,

    /// Full replacement content, already truncated to the platform ceiling.
    pub content: String,

    /// True when the update bypassed throttling (queue change, finalization).
    pub forced: bool,
}
