//! Configuration file loader for the `.relay-kit/` directory.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AgentSettings, RelayConfig};
use std::path::{Path, PathBuf};

/// Loads the relay configuration from `<root>/.relay-kit/config.toml`.
///
/// A missing directory or file yields the default configuration rather than
/// an error; an unreadable or syntactically invalid file is an error.
pub async fn load_config(root: &Path) -> ConfigResult<RelayConfig> {
    let config_path = root.join(".relay-kit").join("config.toml");

    if !config_path.exists() {
        return Ok(RelayConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: RelayConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &RelayConfig) -> ConfigResult<()> {
    if config.run.max_run_secs == 0 {
        return Err(ConfigError::InvalidConfig {
            reason: "run.max_run_secs must be greater than zero".to_string(),
        });
    }
    if config.run.interrupt_grace_ms == 0 {
        return Err(ConfigError::InvalidConfig {
            reason: "run.interrupt_grace_ms must be greater than zero".to_string(),
        });
    }
    if config.display.max_message_chars == 0 {
        return Err(ConfigError::InvalidConfig {
            reason: "display.max_message_chars must be greater than zero".to_string(),
        });
    }
    if config.display.heartbeat_ms == 0 {
        return Err(ConfigError::InvalidConfig {
            reason: "display.heartbeat_ms must be greater than zero".to_string(),
        });
    }
    if config.agent.command.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            reason: "agent.command must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Resolve the agent command to an absolute path.
///
/// A bare name is looked up on `PATH`; anything containing a separator is
/// used as given (the spawn will report a missing file on its own).
pub fn resolve_agent_command(agent: &AgentSettings) -> ConfigResult<PathBuf> {
    if agent.command.contains(std::path::MAIN_SEPARATOR) {
        return Ok(PathBuf::from(&agent.command));
    }

    which::which(&agent.command).map_err(|source| ConfigError::AgentNotFound {
        command: agent.command.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_config_missing_directory_yields_defaults() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path())
            .await
            .expect("Should handle missing .relay-kit");

        assert_eq!(config, RelayConfig::default());
    }

    #[tokio::test]
    async fn test_load_config_reads_values() {
        let dir = tempdir().expect("Failed to create temp dir");
        let rk_dir = dir.path().join(".relay-kit");
        fs::create_dir_all(&rk_dir).expect("Failed to create .relay-kit");

        let config_toml = r#"
            log_dir = "/var/log/relay"

            [agent]
            command = "coder"

            [run]
            max_run_secs = 120
            interrupt_grace_ms = 250

            [display]
            heartbeat_ms = 500
        "#;
        fs::write(rk_dir.join("config.toml"), config_toml).expect("Failed to write config.toml");

        let config = load_config(dir.path()).await.expect("Failed to load config");

        assert_eq!(config.agent.command, "coder");
        assert_eq!(config.run.max_run_secs, 120);
        assert_eq!(config.run.interrupt_grace_ms, 250);
        assert_eq!(config.display.heartbeat_ms, 500);
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/relay"));
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let rk_dir = dir.path().join(".relay-kit");
        fs::create_dir_all(&rk_dir).expect("Failed to create .relay-kit");

        fs::write(rk_dir.join("config.toml"), "run = [invalid toml")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;
        assert!(result.is_err(), "Should fail on invalid TOML");

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_timeout() {
        let dir = tempdir().expect("Failed to create temp dir");
        let rk_dir = dir.path().join(".relay-kit");
        fs::create_dir_all(&rk_dir).expect("Failed to create .relay-kit");

        fs::write(rk_dir.join("config.toml"), "[run]\nmax_run_secs = 0")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_resolve_agent_command_with_separator_is_used_verbatim() {
        let agent = AgentSettings {
            command: "/opt/agent/bin/agent".to_string(),
            ..AgentSettings::default()
        };
        let path = resolve_agent_command(&agent).expect("resolve");
        assert_eq!(path, PathBuf::from("/opt/agent/bin/agent"));
    }

    #[test]
    fn test_resolve_agent_command_missing_binary() {
        let agent = AgentSettings {
            command: "definitely-not-installed-xyz".to_string(),
            ..AgentSettings::default()
        };
        let result = resolve_agent_command(&agent);
        assert!(matches!(result, Err(ConfigError::AgentNotFound { .. })));
    }

    #[test]
    fn test_resolve_agent_command_on_path() {
        let agent = AgentSettings {
            command: "sh".to_string(),
            ..AgentSettings::default()
        };
        let path = resolve_agent_command(&agent).expect("sh should be on PATH");
        assert!(path.is_absolute());
    }
}
