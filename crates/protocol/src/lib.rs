//! # rk-protocol
//!
//! Core protocol definitions and data models for relay-kit.
//!
//! This crate defines all shared data structures used for:
//! - Typed progress events decoded from the agent's output stream
//! - Terminal run outcomes and collected run metadata
//! - Request submission and interrupt replies
//! - Outbound live-display updates toward the chat surface
//!
//! ## Modules
//!
//! - [`progress_models`]: Progress events produced by the event parser
//! - [`run_models`]: Run phases, outcomes and metadata
//! - [`request_models`]: Submission payloads and their replies
//! - [`ipc`]: Display slots and live-update records for the chat transport
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde
//! - Independent compilation: no dependencies on other relay-kit crates

pub mod ipc;
pub mod progress_models;
pub mod request_models;
pub mod run_models;

// Re-export all public types for convenience
pub use ipc::*;
pub use progress_models::*;
pub use request_models::*;
pub use run_models::*;
