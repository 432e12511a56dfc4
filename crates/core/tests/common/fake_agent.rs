//! Scripted stand-ins for the external coding agent.
//!
//! Each helper writes a small shell script to the test's tempdir; the relay
//! launches it like the real agent binary. Scripts receive the regular
//! argument shape (`--prompt <text>`), so `$2` is the prompt.

use rk_core::config::models::RelayConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable agent script with the given body.
#[allow(dead_code)]
pub fn write_agent_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write agent script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to mark script executable");
    }

    path
}

/// Relay configuration pointed at a scripted agent, with short limits and a
/// fast heartbeat suited to tests.
#[allow(dead_code)]
pub fn relay_config(script: &Path, dir: &Path) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.agent.command = script.display().to_string();
    config.agent.base_args = Vec::new();
    config.log_dir = Some(dir.join("logs"));
    config.working_dir = Some(dir.to_path_buf());
    config.run.max_run_secs = 10;
    config.run.interrupt_grace_ms = 300;
    config.display.heartbeat_ms = 50;
    config
}

/// An agent that emits a well-formed structured run and exits cleanly.
#[allow(dead_code)]
pub fn completing_agent(dir: &Path) -> PathBuf {
    write_agent_script(
        dir,
        "completing-agent.sh",
        r#"echo '{"type":"step_start","session_id":"s-100"}'
echo '{"type":"tool","name":"bash","detail":"cargo check"}'
echo '{"type":"text","kind":"final","content":"All good."}'
echo '{"type":"step_end","reason":"completed"}'"#,
    )
}

/// An agent that records its prompt, works briefly, then answers.
#[allow(dead_code)]
pub fn prompt_logging_agent(dir: &Path) -> PathBuf {
    write_agent_script(
        dir,
        "logging-agent.sh",
        r#"echo "$2" >> "$RELAY_TEST_LOG"
sleep 0.3
echo '{"type":"text","kind":"final","content":"ok"}'"#,
    )
}

/// An agent that never finishes on its own.
#[allow(dead_code)]
pub fn hanging_agent(dir: &Path) -> PathBuf {
    write_agent_script(dir, "hanging-agent.sh", "sleep 30")
}

/// An agent that ignores the graceful signal, forcing escalation.
#[allow(dead_code)]
pub fn stubborn_agent(dir: &Path) -> PathBuf {
    write_agent_script(
        dir,
        "stubborn-agent.sh",
        r#"trap '' TERM
while :; do sleep 0.1; done"#,
    )
}

/// An agent that hits a rate limit and exits without an answer.
#[allow(dead_code)]
pub fn rate_limited_agent(dir: &Path) -> PathBuf {
    write_agent_script(
        dir,
        "rate-limited-agent.sh",
        r#"echo 'HTTP 429 Too Many Requests, retry_after=30' 1>&2
exit 0"#,
    )
}
