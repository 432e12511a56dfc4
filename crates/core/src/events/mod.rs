//! Event parsing for the agent's output streams.
//!
//! This module turns raw byte chunks from the child process into typed
//! [`rk_protocol::ProgressEvent`]s:
//! - [`splitter`]: reassembles lines across arbitrary chunk boundaries
//! - [`records`]: the documented NDJSON record shapes on stdout
//! - [`parser`]: decodes lines into progress events
//! - [`stderr`]: diagnostic ring buffer and rate-limit classification

pub mod parser;
pub mod records;
pub mod splitter;
pub mod stderr;

pub use parser::EventParser;
pub use splitter::LineSplitter;
pub use stderr::StderrMonitor;
