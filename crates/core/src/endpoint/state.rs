//! Endpoint and run state owned by the orchestration actor.

use crate::interrupt::controller::InterruptTrace;
use rk_protocol::{RunPhase, RunRequest, WaitingInfo};
use std::collections::VecDeque;

/// How many recent tool names are kept for the diagnostic fallback.
const RECENT_TOOLS_KEPT: usize = 5;

/// Long-lived state of one managed endpoint.
///
/// Created when the endpoint's actor starts and kept for the actor's whole
/// lifetime. Only the actor mutates it.
///
/// Invariant: `active == false` implies no current pid and no interrupt
/// trace.
#[derive(Debug, Default)]
pub struct EndpointRunState {
    /// True while an agent process is executing for this endpoint.
    pub active: bool,

    /// Pid of the in-flight agent process; `None` when idle.
    pub current_pid: Option<u32>,

    /// Present only during/after an interrupt attempt; cleared at
    /// finalization.
    pub interrupt: Option<InterruptTrace>,

    /// Set while the agent reports itself blocked upstream; cleared by the
    /// next substantive event and at finalization.
    pub waiting: Option<WaitingInfo>,

    /// Pending requests in strict submission order.
    pub backlog: VecDeque<RunRequest>,
}

/// In-memory progress counters for the run currently executing.
///
/// Feeds the status panel and the no-output diagnostic fallback; discarded
/// at run end.
#[derive(Debug)]
pub struct RunProgress {
    pub phase: RunPhase,
    pub steps: u32,
    pub tools: u32,

    /// Most recent tool invocations, oldest first, bounded.
    pub recent_tools: Vec<String>,

    /// Backlog depth at the time of the last panel render.
    pub queue_depth: usize,

    /// Continuation id the run started from (or picked up mid-run).
    pub session_id: Option<String>,

    /// Mirror of the endpoint's waiting info for rendering.
    pub waiting: Option<WaitingInfo>,

    /// Last raw diagnostic line sampled from the stream.
    pub last_diagnostic: Option<String>,
}

impl RunProgress {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            phase: RunPhase::Launching,
            steps: 0,
            tools: 0,
            recent_tools: Vec::new(),
            queue_depth,
            session_id: None,
            waiting: None,
            last_diagnostic: None,
        }
    }

    /// Record a tool invocation, keeping only the most recent few names.
    pub fn note_tool(&mut self, name: &str, detail: &str) {
        self.tools += 1;
        let label = if detail.is_empty() {
            name.to_string()
        } else {
            format!("{name}: {detail}")
        };
        if self.recent_tools.len() == RECENT_TOOLS_KEPT {
            self.recent_tools.remove(0);
        }
        self.recent_tools.push(label);
    }
}
