//! Configuration loading and management.
//!
//! This module provides functionality to load and validate the relay
//! configuration from the `.relay-kit/` directory.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, resolve_agent_command};
pub use models::{AgentSettings, DisplaySettings, RelayConfig, RunLimitSettings};
