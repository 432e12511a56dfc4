//! Per-endpoint run serialization and orchestration.
//!
//! Exactly one agent process may be active per endpoint at any instant.
//! This is enforced structurally: each endpoint is driven by a single actor
//! task that owns the endpoint's state exclusively and executes runs one at
//! a time, draining its FIFO backlog between them.
//!
//! - [`state`]: the endpoint's run state and per-run progress counters
//! - [`actor`]: the actor task, its command channel, and run orchestration

pub mod actor;
pub mod state;

pub use actor::{EndpointActor, EndpointHandle};
pub use state::{EndpointRunState, RunProgress};
