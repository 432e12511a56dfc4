//! Adaptive throttling of the two live messages.
//!
//! Each slot has its own minimum re-render interval: a base value that is
//! shorter in verbose mode, widened while the run is idle (no new event).
//! Content that matches the last pushed content is suppressed entirely; a
//! forced update (queue change, finalization) bypasses both checks.

use crate::config::models::DisplaySettings;
use rk_protocol::DisplaySlot;
use std::time::Duration;
use tokio::time::Instant;

/// Idle tier thresholds: beyond these, the effective interval coarsens.
const IDLE_TIER_ONE: Duration = Duration::from_secs(4);
const IDLE_TIER_TWO: Duration = Duration::from_secs(12);

#[derive(Debug, Default)]
struct SlotState {
    last_content: Option<String>,
    last_push_at: Option<Instant>,
}

/// Decides when each live message is actually re-rendered.
#[derive(Debug)]
pub struct DisplayThrottler {
    settings: DisplaySettings,
    verbose: bool,
    last_event_at: Instant,
    panel: SlotState,
    preview: SlotState,
}

impl DisplayThrottler {
    pub fn new(settings: DisplaySettings, verbose: bool) -> Self {
        Self {
            settings,
            verbose,
            last_event_at: Instant::now(),
            panel: SlotState::default(),
            preview: SlotState::default(),
        }
    }

    /// Record that a fresh event arrived; resets the idle clock.
    pub fn note_event(&mut self) {
        self.last_event_at = Instant::now();
    }

    /// The heartbeat cadence for refresh checks during silence.
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.settings.heartbeat_ms)
    }

    /// Decide whether `content` should be pushed to `slot` now.
    ///
    /// Returns the content truncated to the platform ceiling when a push is
    /// due, `None` when it is suppressed. Forced updates skip the interval
    /// and identity checks.
    pub fn decide(&mut self, slot: DisplaySlot, content: &str, force: bool) -> Option<String> {
        let truncated = truncate_chars(content, self.settings.max_message_chars);
        let interval = self.effective_interval(slot);
        let now = Instant::now();

        let state = match slot {
            DisplaySlot::Panel => &mut self.panel,
            DisplaySlot::Preview => &mut self.preview,
        };

        if !force {
            if state.last_content.as_deref() == Some(truncated.as_str()) {
                return None;
            }
            if let Some(last_push) = state.last_push_at {
                if now.duration_since(last_push) < interval {
                    return None;
                }
            }
        }

        state.last_content = Some(truncated.clone());
        state.last_push_at = Some(now);
        Some(truncated)
    }

    fn base_interval(&self, slot: DisplaySlot) -> Duration {
        let ms = match (slot, self.verbose) {
            (DisplaySlot::Panel, true) => self.settings.panel_interval_verbose_ms,
            (DisplaySlot::Panel, false) => self.settings.panel_interval_ms,
            (DisplaySlot::Preview, true) => self.settings.preview_interval_verbose_ms,
            (DisplaySlot::Preview, false) => self.settings.preview_interval_ms,
        };
        Duration::from_millis(ms)
    }

    /// Base interval widened by how long the run has been idle.
    fn effective_interval(&self, slot: DisplaySlot) -> Duration {
        let idle = self.last_event_at.elapsed();
        let factor = if idle >= IDLE_TIER_TWO {
            4
        } else if idle >= IDLE_TIER_ONE {
            2
        } else {
            1
        };
        self.base_interval(slot) * factor
    }
}

/// Truncate to a character budget, marking the cut with an ellipsis.
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut out: String = content.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
