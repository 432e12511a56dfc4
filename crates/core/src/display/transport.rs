//! Chat transport seam.
//!
//! The chat surface itself (message ids, wire protocol, formatting beyond
//! truncation) is an external collaborator. The core only needs to edit the
//! two live messages, announce queued submissions, and deliver the one
//! terminal message per run.

use async_trait::async_trait;
use rk_protocol::{FinalOutcome, LiveUpdate};
use thiserror::Error;

/// Errors surfaced by the chat surface.
///
/// Live-edit failures are transient by nature (the message may be gone, the
/// transport flaky); callers log and skip them, they are never fatal to a
/// run.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("live message edit rejected: {0}")]
    EditRejected(String),

    #[error("chat transport unavailable: {0}")]
    Unavailable(String),
}

/// Outbound surface toward the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Edit one of the two live messages in place.
    async fn edit_live(&self, update: LiveUpdate) -> Result<(), TransportError>;

    /// Tell the requester their submission was queued at the given depth.
    async fn announce_queued(&self, endpoint_id: &str, depth: usize)
        -> Result<(), TransportError>;

    /// Deliver the run's terminal message.
    async fn send_final(
        &self,
        endpoint_id: &str,
        outcome: FinalOutcome,
    ) -> Result<(), TransportError>;
}
