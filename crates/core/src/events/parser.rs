//! Stdout chunk decoding into progress events.

use crate::events::records::AgentRecord;
use crate::events::splitter::LineSplitter;
use rk_protocol::ProgressEvent;

/// Maximum length preserved for an unparsed output line.
const RAW_LINE_MAX_CHARS: usize = 500;

/// Decodes the agent's stdout byte stream into [`ProgressEvent`]s.
///
/// The parser is fed chunks with no framing guarantee; lines are reassembled
/// internally. Each complete line is decoded as an [`AgentRecord`]; unknown
/// or malformed lines are preserved as [`ProgressEvent::RawLine`] with their
/// content capped. Empty lines are skipped.
#[derive(Debug, Default)]
pub struct EventParser {
    splitter: LineSplitter,
    latest_session_id: Option<String>,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of stdout bytes and return the events it completed.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<ProgressEvent> {
        self.splitter
            .push(chunk)
            .into_iter()
            .filter_map(|line| self.decode_line(&line))
            .collect()
    }

    /// Signal end of stream; a non-empty trailing partial line gets one
    /// final decode attempt.
    pub fn finish(&mut self) -> Vec<ProgressEvent> {
        self.splitter
            .finish()
            .and_then(|line| self.decode_line(&line))
            .into_iter()
            .collect()
    }

    /// The latest non-empty continuation/session id observed so far.
    pub fn latest_session_id(&self) -> Option<&str> {
        self.latest_session_id.as_deref()
    }

    fn decode_line(&mut self, line: &str) -> Option<ProgressEvent> {
        if line.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<AgentRecord>(line) {
            Ok(record) => {
                if let Some(sid) = record.session_id() {
                    self.latest_session_id = Some(sid.to_string());
                }
                Some(record.into_event())
            }
            Err(_) => Some(ProgressEvent::RawLine {
                content: cap_chars(line, RAW_LINE_MAX_CHARS),
            }),
        }
    }
}

fn cap_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_protocol::TextKind;

    fn sample_stream() -> &'static str {
        concat!(
            r#"{"type":"step_start","session_id":"s-1"}"#,
            "\n",
            r#"{"type":"tool","name":"bash","detail":"cargo build"}"#,
            "\n",
            "plain diagnostic line\n",
            r#"{"type":"text","kind":"final","content":"done","session_id":"s-2"}"#,
            "\n",
            r#"{"type":"step_end","reason":"completed"}"#,
            "\n",
        )
    }

    fn expected_events() -> Vec<ProgressEvent> {
        vec![
            ProgressEvent::StepStarted,
            ProgressEvent::ToolInvoked {
                name: "bash".to_string(),
                detail: "cargo build".to_string(),
            },
            ProgressEvent::RawLine {
                content: "plain diagnostic line".to_string(),
            },
            ProgressEvent::TextChunk {
                content: "done".to_string(),
                kind: TextKind::Final,
            },
            ProgressEvent::StepFinished {
                reason: "completed".to_string(),
            },
        ]
    }

    #[test]
    fn test_decode_unsplit_stream() {
        let mut parser = EventParser::new();
        let mut events = parser.push_chunk(sample_stream().as_bytes());
        events.extend(parser.finish());

        assert_eq!(events, expected_events());
        assert_eq!(parser.latest_session_id(), Some("s-2"));
    }

    #[test]
    fn test_split_at_arbitrary_boundaries_yields_identical_events() {
        let input = sample_stream().as_bytes();

        for split_at in 0..input.len() {
            let mut parser = EventParser::new();
            let mut events = parser.push_chunk(&input[..split_at]);
            events.extend(parser.push_chunk(&input[split_at..]));
            events.extend(parser.finish());

            assert_eq!(events, expected_events(), "split at byte {split_at}");
            assert_eq!(parser.latest_session_id(), Some("s-2"));
        }
    }

    #[test]
    fn test_malformed_json_becomes_raw_line() {
        let mut parser = EventParser::new();
        let events = parser.push_chunk(b"{\"type\":\"tool\",broken\n");
        assert_eq!(
            events,
            vec![ProgressEvent::RawLine {
                content: "{\"type\":\"tool\",broken".to_string()
            }]
        );
    }

    #[test]
    fn test_unknown_record_type_becomes_raw_line() {
        let mut parser = EventParser::new();
        let events = parser.push_chunk(b"{\"type\":\"telemetry\",\"x\":1}\n");
        assert!(matches!(events[0], ProgressEvent::RawLine { .. }));
    }

    #[test]
    fn test_trailing_partial_line_flushed_on_finish() {
        let mut parser = EventParser::new();
        assert!(parser
            .push_chunk(br#"{"type":"step_start"}"#)
            .is_empty());
        let events = parser.finish();
        assert_eq!(events, vec![ProgressEvent::StepStarted]);
    }

    #[test]
    fn test_raw_line_content_is_capped() {
        let mut parser = EventParser::new();
        let long = "x".repeat(2000);
        let events = parser.push_chunk(format!("{long}\n").as_bytes());
        match &events[0] {
            ProgressEvent::RawLine { content } => assert_eq!(content.chars().count(), 500),
            other => panic!("expected RawLine, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_lines_skipped() {
        let mut parser = EventParser::new();
        let events = parser.push_chunk(b"\n\n  \n");
        assert!(events.is_empty());
    }
}
