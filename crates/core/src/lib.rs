//! # rk-core
//!
//! Core task execution engine for relay-kit.
//!
//! This crate relays conversational requests to an external coding-agent
//! process and streams its progress back to two live-updating chat messages,
//! one active execution per endpoint at a time. It provides:
//!
//! - Decoding of the agent's newline-delimited JSON output into typed events
//! - Process supervision with an absolute run timeout and transcript logging
//! - A two-phase (graceful, then forceful) cancellation protocol
//! - Adaptive throttling of the two outbound live messages
//! - Per-endpoint single-flight run serialization with a FIFO backlog
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from the `.relay-kit/` directory
//! - [`events`]: Stream splitting, record decoding and stderr classification
//! - [`supervisor`]: Agent process spawning, timeout and outcome reporting
//! - [`interrupt`]: Cancellation state machine and signal delivery
//! - [`display`]: Chat transport seam and live-message throttling
//! - [`endpoint`]: Per-endpoint run queue and orchestration actor
//! - [`session`]: Continuation/session id persistence
//! - [`relay`]: Public facade tying the pieces together

pub mod config;
pub mod display;
pub mod endpoint;
pub mod events;
pub mod interrupt;
pub mod relay;
pub mod session;
pub mod supervisor;
