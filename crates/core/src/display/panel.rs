//! Panel and preview content rendering.

use crate::endpoint::state::RunProgress;
use rk_protocol::RunPhase;

/// Shown in the preview slot until the agent produces any text.
const PREVIEW_PLACEHOLDER: &str = "The agent is working; no output yet.";

/// Render the structured status panel for one run.
///
/// Plain HTML, one detail per line; the throttler truncates to the platform
/// ceiling, so rendering itself does not cap anything.
pub fn render_panel(endpoint_id: &str, progress: &RunProgress) -> String {
    let mut out = format!(
        "<b>agent run</b> [{}] on {}\n",
        phase_label(progress.phase),
        endpoint_id
    );
    out.push_str(&format!(
        "steps: {} | tool calls: {}\n",
        progress.steps, progress.tools
    ));

    if let Some(tool) = progress.recent_tools.last() {
        out.push_str(&format!("tool: {tool}\n"));
    }
    if let Some(waiting) = &progress.waiting {
        match waiting.retry_after_secs {
            Some(secs) => out.push_str(&format!(
                "waiting: {} (retry in ~{}s)\n",
                waiting.status, secs
            )),
            None => out.push_str(&format!("waiting: {}\n", waiting.status)),
        }
    }
    if progress.queue_depth > 0 {
        out.push_str(&format!("queued requests: {}\n", progress.queue_depth));
    }
    if let Some(sid) = &progress.session_id {
        out.push_str(&format!("session: <code>{sid}</code>\n"));
    }
    if let Some(diag) = &progress.last_diagnostic {
        out.push_str(&format!("last output: {diag}\n"));
    }

    out
}

fn phase_label(phase: RunPhase) -> &'static str {
    match phase {
        RunPhase::Launching => "launching",
        RunPhase::Running => "running",
        RunPhase::Waiting => "waiting",
        RunPhase::Finalizing => "finalizing",
    }
}

/// Accumulates streamed text for the preview slot.
///
/// Final-channel text is appended and always wins; reasoning text only
/// shows while no final text has arrived, latest chunk only.
#[derive(Debug, Default)]
pub struct PreviewBuffer {
    final_text: String,
    last_reasoning: Option<String>,
}

impl PreviewBuffer {
    pub fn push_final(&mut self, chunk: &str) {
        self.final_text.push_str(chunk);
    }

    pub fn push_reasoning(&mut self, chunk: &str) {
        self.last_reasoning = Some(chunk.to_string());
    }

    /// The preview content: final text, else latest reasoning, else a
    /// synthesized placeholder.
    pub fn render(&self) -> String {
        let final_text = self.final_text.trim();
        if !final_text.is_empty() {
            return final_text.to_string();
        }
        match &self.last_reasoning {
            Some(reasoning) if !reasoning.trim().is_empty() => reasoning.trim().to_string(),
            _ => PREVIEW_PLACEHOLDER.to_string(),
        }
    }
}
