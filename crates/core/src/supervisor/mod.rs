//! Agent process supervision.
//!
//! This module spawns the external agent, wires its output streams into the
//! event parser and stderr monitor, mirrors both streams into a per-endpoint
//! transcript log, enforces the absolute run timeout, and reports exactly
//! one terminal [`RunOutcome`] per run.

pub mod command;
pub mod process;

pub use command::build_launch_spec;
pub use process::{LaunchSpec, RunLimits, RunningAgent, SpawnError, Supervisor};
