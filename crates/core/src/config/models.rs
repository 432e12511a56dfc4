//! Configuration models for `.relay-kit/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default maximum wall-clock runtime of one run, in seconds.
pub const DEFAULT_MAX_RUN_SECS: u64 = 3600;

/// Default grace window between the graceful and forceful signals, in ms.
pub const DEFAULT_INTERRUPT_GRACE_MS: u64 = 5000;

/// Top-level relay configuration.
///
/// Every section is optional in the file; missing sections and fields fall
/// back to defaults, so an empty (or absent) `config.toml` is valid.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    pub agent: AgentSettings,
    pub run: RunLimitSettings,
    pub display: DisplaySettings,

    /// Directory for per-endpoint transcript logs.
    pub log_dir: Option<PathBuf>,

    /// Working directory for spawned agent processes; defaults to the
    /// process's own working directory.
    pub working_dir: Option<PathBuf>,
}

impl RelayConfig {
    /// Effective transcript log directory.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".relay-kit").join("logs"))
    }
}

/// How to launch the external coding agent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AgentSettings {
    /// Binary name or path of the agent CLI.
    pub command: String,

    /// Arguments always passed before the per-run ones.
    pub base_args: Vec<String>,

    /// Flag used to pass the conversational prompt.
    pub prompt_flag: String,

    /// Flag used to resume a previous session by continuation id.
    pub resume_flag: String,

    /// Extra environment variables for the agent process.
    pub env: BTreeMap<String, String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            command: "agent".to_string(),
            base_args: vec!["--output-format".to_string(), "stream-json".to_string()],
            prompt_flag: "--prompt".to_string(),
            resume_flag: "--resume".to_string(),
            env: BTreeMap::new(),
        }
    }
}

/// Run duration and cancellation limits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RunLimitSettings {
    /// Absolute wall-clock ceiling for one run, in seconds.
    pub max_run_secs: u64,

    /// Grace window between graceful and forceful termination, in ms.
    pub interrupt_grace_ms: u64,
}

impl Default for RunLimitSettings {
    fn default() -> Self {
        Self {
            max_run_secs: DEFAULT_MAX_RUN_SECS,
            interrupt_grace_ms: DEFAULT_INTERRUPT_GRACE_MS,
        }
    }
}

/// Live-display cadence tuning.
///
/// Each live message has its own minimum re-render interval with a shorter
/// variant for verbose runs; the heartbeat drives refresh checks during
/// silent stretches.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    pub heartbeat_ms: u64,
    pub panel_interval_ms: u64,
    pub panel_interval_verbose_ms: u64,
    pub preview_interval_ms: u64,
    pub preview_interval_verbose_ms: u64,

    /// Platform ceiling for one outbound message, in characters.
    pub max_message_chars: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            heartbeat_ms: 1500,
            panel_interval_ms: 3000,
            panel_interval_verbose_ms: 1500,
            preview_interval_ms: 2500,
            preview_interval_verbose_ms: 1000,
            max_message_chars: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.run.max_run_secs, 3600);
        assert_eq!(config.run.interrupt_grace_ms, 5000);
        assert_eq!(config.display.heartbeat_ms, 1500);
        assert_eq!(config.display.max_message_chars, 4096);
        assert_eq!(config.agent.command, "agent");
        assert_eq!(config.log_dir(), PathBuf::from(".relay-kit/logs"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [run]
            max_run_secs = 60
            "#,
        )
        .expect("parse");

        assert_eq!(config.run.max_run_secs, 60);
        assert_eq!(config.run.interrupt_grace_ms, 5000);
        assert_eq!(config.agent.prompt_flag, "--prompt");
    }

    #[test]
    fn test_agent_section_round_trip() {
        let config: RelayConfig = toml::from_str(
            r#"
            [agent]
            command = "/usr/local/bin/coder"
            base_args = ["--headless"]
            prompt_flag = "-p"
            resume_flag = "--continue"

            [agent.env]
            CODER_HOME = "/tmp/coder"
            "#,
        )
        .expect("parse");

        assert_eq!(config.agent.command, "/usr/local/bin/coder");
        assert_eq!(config.agent.base_args, vec!["--headless"]);
        assert_eq!(config.agent.prompt_flag, "-p");
        assert_eq!(
            config.agent.env.get("CODER_HOME"),
            Some(&"/tmp/coder".to_string())
        );
    }
}
