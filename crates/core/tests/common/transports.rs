//! Recording chat transport for deterministic assertions.

use async_trait::async_trait;
use rk_core::display::transport::{ChatTransport, TransportError};
use rk_protocol::{FinalOutcome, LiveUpdate};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Captures every outbound interaction instead of talking to a chat surface.
///
/// Terminal outcomes are forwarded on a channel so tests can await them;
/// live updates and queue announcements are inspected after the fact.
pub struct RecordingTransport {
    updates: Mutex<Vec<LiveUpdate>>,
    queued: Mutex<Vec<(String, usize)>>,
    finals_tx: mpsc::UnboundedSender<(String, FinalOutcome)>,
}

impl RecordingTransport {
    #[allow(dead_code)]
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, FinalOutcome)>) {
        let (finals_tx, finals_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            updates: Mutex::new(Vec::new()),
            queued: Mutex::new(Vec::new()),
            finals_tx,
        });
        (transport, finals_rx)
    }

    #[allow(dead_code)]
    pub fn updates(&self) -> Vec<LiveUpdate> {
        self.updates.lock().expect("updates mutex").clone()
    }

    #[allow(dead_code)]
    pub fn queued(&self) -> Vec<(String, usize)> {
        self.queued.lock().expect("queued mutex").clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn edit_live(&self, update: LiveUpdate) -> Result<(), TransportError> {
        self.updates.lock().expect("updates mutex").push(update);
        Ok(())
    }

    async fn announce_queued(
        &self,
        endpoint_id: &str,
        depth: usize,
    ) -> Result<(), TransportError> {
        self.queued
            .lock()
            .expect("queued mutex")
            .push((endpoint_id.to_string(), depth));
        Ok(())
    }

    async fn send_final(
        &self,
        endpoint_id: &str,
        outcome: FinalOutcome,
    ) -> Result<(), TransportError> {
        self.finals_tx
            .send((endpoint_id.to_string(), outcome))
            .map_err(|_| TransportError::Unavailable("finals receiver dropped".to_string()))
    }
}
