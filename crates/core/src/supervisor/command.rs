//! Agent command-line assembly.

use crate::config::models::AgentSettings;
use crate::supervisor::process::LaunchSpec;
use std::path::PathBuf;

/// Build the launch specification for one run.
///
/// Argument order: the configured base arguments, then the resume flag with
/// the continuation id (when resuming), then the prompt flag with the
/// request prompt.
pub fn build_launch_spec(
    command: PathBuf,
    agent: &AgentSettings,
    prompt: &str,
    session_id: Option<String>,
    working_dir: PathBuf,
) -> LaunchSpec {
    let mut args = agent.base_args.clone();

    if let Some(sid) = &session_id {
        args.push(agent.resume_flag.clone());
        args.push(sid.clone());
    }

    args.push(agent.prompt_flag.clone());
    args.push(prompt.to_string());

    LaunchSpec {
        command,
        args,
        working_dir,
        env: agent.env.clone(),
        session_id,
    }
}
