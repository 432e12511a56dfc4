//! Structured record shapes emitted by the agent on stdout.
//!
//! The external agent is a black box except for this wire contract: one JSON
//! record per line, distinguished by a `type` discriminator. Every record may
//! carry a `session_id` continuation token; the parser retains the latest
//! non-empty one it sees.
//!
//! Example stream:
//!
//! ```json
//! {"type":"step_start","session_id":"s-81f2"}
//! {"type":"tool","name":"bash","detail":"cargo test"}
//! {"type":"text","kind":"final","content":"All tests pass."}
//! {"type":"step_end","reason":"completed"}
//! ```

use rk_protocol::{ProgressEvent, TextKind};
use serde::Deserialize;

/// One decoded stdout record.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentRecord {
    /// The agent began a working step.
    StepStart {
        #[serde(default)]
        session_id: Option<String>,
    },

    /// The agent finished its current step.
    StepEnd {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Streamed text on the reasoning or final channel.
    Text {
        content: String,
        /// Missing kind means final answer text.
        #[serde(default)]
        kind: Option<TextKind>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// A tool invocation with a short description.
    Tool {
        name: String,
        #[serde(default)]
        detail: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// The agent is blocked upstream (quota, rate limiting).
    Wait {
        status: String,
        #[serde(default)]
        retry_after_secs: Option<u64>,
        #[serde(default)]
        session_id: Option<String>,
    },
}

impl AgentRecord {
    /// The continuation token carried by this record, if any.
    pub fn session_id(&self) -> Option<&str> {
        let sid = match self {
            AgentRecord::StepStart { session_id }
            | AgentRecord::StepEnd { session_id, .. }
            | AgentRecord::Text { session_id, .. }
            | AgentRecord::Tool { session_id, .. }
            | AgentRecord::Wait { session_id, .. } => session_id,
        };
        sid.as_deref().filter(|s| !s.is_empty())
    }

    /// Convert the wire record into the typed progress event.
    pub fn into_event(self) -> ProgressEvent {
        match self {
            AgentRecord::StepStart { .. } => ProgressEvent::StepStarted,
            AgentRecord::StepEnd { reason, .. } => ProgressEvent::StepFinished {
                reason: reason.unwrap_or_else(|| "completed".to_string()),
            },
            AgentRecord::Text { content, kind, .. } => ProgressEvent::TextChunk {
                content,
                kind: kind.unwrap_or(TextKind::Final),
            },
            AgentRecord::Tool { name, detail, .. } => ProgressEvent::ToolInvoked {
                name,
                detail: detail.unwrap_or_default(),
            },
            AgentRecord::Wait {
                status,
                retry_after_secs,
                ..
            } => ProgressEvent::Waiting {
                status,
                retry_after_secs,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_start_record() {
        let record: AgentRecord =
            serde_json::from_str(r#"{"type":"step_start","session_id":"s-1"}"#).expect("decode");
        assert_eq!(record.session_id(), Some("s-1"));
        assert_eq!(record.into_event(), ProgressEvent::StepStarted);
    }

    #[test]
    fn test_text_record_defaults_to_final() {
        let record: AgentRecord =
            serde_json::from_str(r#"{"type":"text","content":"done"}"#).expect("decode");
        assert_eq!(
            record.into_event(),
            ProgressEvent::TextChunk {
                content: "done".to_string(),
                kind: TextKind::Final,
            }
        );
    }

    #[test]
    fn test_tool_record_without_detail() {
        let record: AgentRecord =
            serde_json::from_str(r#"{"type":"tool","name":"read_file"}"#).expect("decode");
        assert_eq!(
            record.into_event(),
            ProgressEvent::ToolInvoked {
                name: "read_file".to_string(),
                detail: String::new(),
            }
        );
    }

    #[test]
    fn test_empty_session_id_is_ignored() {
        let record: AgentRecord =
            serde_json::from_str(r#"{"type":"step_start","session_id":""}"#).expect("decode");
        assert_eq!(record.session_id(), None);
    }

    #[test]
    fn test_wait_record() {
        let record: AgentRecord = serde_json::from_str(
            r#"{"type":"wait","status":"rate limited","retry_after_secs":30}"#,
        )
        .expect("decode");
        assert_eq!(
            record.into_event(),
            ProgressEvent::Waiting {
                status: "rate limited".to_string(),
                retry_after_secs: Some(30),
            }
        );
    }
}
