//! Console chat transport.
//!
//! Stands in for the real chat surface when running from a terminal: live
//! message edits are printed as replacement snapshots, and the terminal
//! outcome is forwarded to the caller through a channel.

use async_trait::async_trait;
use colored::Colorize;
use rk_core::display::transport::{ChatTransport, TransportError};
use rk_protocol::{DisplaySlot, FinalOutcome, LiveUpdate};
use tokio::sync::mpsc;

pub struct ConsoleTransport {
    final_tx: mpsc::UnboundedSender<FinalOutcome>,
}

impl ConsoleTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FinalOutcome>) {
        let (final_tx, final_rx) = mpsc::unbounded_channel();
        (Self { final_tx }, final_rx)
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn edit_live(&self, update: LiveUpdate) -> Result<(), TransportError> {
        let label = match update.slot {
            DisplaySlot::Panel => "panel".cyan().bold(),
            DisplaySlot::Preview => "preview".green().bold(),
        };
        println!("[{label}] {}", update.content.trim_end());
        Ok(())
    }

    async fn announce_queued(
        &self,
        endpoint_id: &str,
        depth: usize,
    ) -> Result<(), TransportError> {
        println!(
            "[{}] request queued for {endpoint_id} at position {depth}",
            "queue".yellow().bold()
        );
        Ok(())
    }

    async fn send_final(
        &self,
        _endpoint_id: &str,
        outcome: FinalOutcome,
    ) -> Result<(), TransportError> {
        self.final_tx
            .send(outcome)
            .map_err(|_| TransportError::Unavailable("console receiver dropped".to_string()))
    }
}
