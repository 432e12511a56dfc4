//! Stderr classification: diagnostics ring buffer and rate-limit detection.

use regex::Regex;
use rk_protocol::RateLimitHint;
use std::collections::VecDeque;

/// How many recent stderr lines are retained for diagnostics.
pub const STDERR_TAIL_LINES: usize = 5;

/// Classifies the agent's stderr lines independently of stdout parsing.
///
/// Every line lands in a bounded ring of recent diagnostics. Lines matching
/// rate-limit vocabulary additionally set a [`RateLimitHint`], with a
/// best-effort attempt to pull a retry-after value out of the text; the most
/// recent detection wins.
#[derive(Debug)]
pub struct StderrMonitor {
    tail: VecDeque<String>,
    rate_limit: Option<RateLimitHint>,
    vocabulary: Regex,
    retry_after: Regex,
}

impl Default for StderrMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl StderrMonitor {
    pub fn new() -> Self {
        Self {
            tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
            rate_limit: None,
            // Known phrasings across providers, plus the bare status code.
            vocabulary: Regex::new(r"(?i)rate[ _-]?limit|too many requests|quota exceeded|\b429\b")
                .expect("rate-limit vocabulary regex is valid"),
            // The retry value has no guaranteed unit; parsed as whole seconds.
            retry_after: Regex::new(r"(?i)(?:retry[ _-]?after|try again in)\D{0,10}(\d{1,6})")
                .expect("retry-after regex is valid"),
        }
    }

    /// Record one stderr line.
    pub fn observe_line(&mut self, line: &str) {
        if self.tail.len() == STDERR_TAIL_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line.to_string());

        if self.vocabulary.is_match(line) {
            let retry_after_secs = self
                .retry_after
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok());
            self.rate_limit = Some(RateLimitHint { retry_after_secs });
        }
    }

    /// The last few stderr lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.tail.iter().cloned().collect()
    }

    /// The most recent rate-limit detection, if any.
    pub fn rate_limit(&self) -> Option<RateLimitHint> {
        self.rate_limit
    }
}
