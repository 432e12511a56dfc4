//! Public facade over the endpoint actors.
//!
//! The relay owns the endpoint map and the shared collaborators (chat
//! transport, session store, signal capability). Endpoint actors are
//! created lazily on first submission and live for the relay's lifetime;
//! nothing outside an actor ever mutates endpoint state.

use crate::config::error::ConfigResult;
use crate::config::loader::resolve_agent_command;
use crate::config::models::RelayConfig;
use crate::display::transport::ChatTransport;
use crate::endpoint::actor::{EndpointActor, EndpointHandle};
use crate::interrupt::controller::InterruptError;
use crate::interrupt::signaler::detect_signaler;
use crate::interrupt::signaler::ProcessSignaler;
use crate::session::SessionStore;
use rk_protocol::{InterruptReply, RunRequest, SubmitResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors surfaced to relay callers.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The endpoint's actor task is gone; the relay is shutting down.
    #[error("endpoint worker is no longer running")]
    WorkerGone,

    /// An interrupt request could not be honored.
    #[error(transparent)]
    Interrupt(#[from] InterruptError),
}

/// Entry point for submitting and interrupting runs.
pub struct Relay {
    config: Arc<RelayConfig>,
    agent_command: PathBuf,
    signaler: Arc<dyn ProcessSignaler>,
    transport: Arc<dyn ChatTransport>,
    sessions: Arc<dyn SessionStore>,
    endpoints: Mutex<HashMap<String, EndpointHandle>>,
}

impl Relay {
    /// Build a relay from configuration and its external collaborators.
    ///
    /// Resolves the agent command up front so a misconfigured binary fails
    /// here rather than on the first submission.
    pub fn new(
        config: RelayConfig,
        transport: Arc<dyn ChatTransport>,
        sessions: Arc<dyn SessionStore>,
    ) -> ConfigResult<Self> {
        let agent_command = resolve_agent_command(&config.agent)?;
        tracing::info!(command = %agent_command.display(), "relay ready");

        Ok(Self {
            config: Arc::new(config),
            agent_command,
            signaler: detect_signaler(),
            transport,
            sessions,
            endpoints: Mutex::new(HashMap::new()),
        })
    }

    /// Submit a request for an endpoint.
    ///
    /// Starts immediately when the endpoint is idle; otherwise the request
    /// joins the endpoint's FIFO backlog and the reply carries its depth.
    pub async fn submit(
        &self,
        endpoint_id: &str,
        request: RunRequest,
    ) -> Result<SubmitResult, RelayError> {
        self.handle_for(endpoint_id).await.submit(request).await
    }

    /// Request cancellation of the endpoint's active run.
    ///
    /// An endpoint that never ran (or whose run already finished) reports
    /// [`InterruptError::NotRunning`].
    pub async fn interrupt(&self, endpoint_id: &str) -> Result<InterruptReply, RelayError> {
        let handle = self.endpoints.lock().await.get(endpoint_id).cloned();
        match handle {
            Some(handle) => handle.interrupt().await,
            None => Err(RelayError::Interrupt(InterruptError::NotRunning)),
        }
    }

    async fn handle_for(&self, endpoint_id: &str) -> EndpointHandle {
        let mut endpoints = self.endpoints.lock().await;
        endpoints
            .entry(endpoint_id.to_string())
            .or_insert_with(|| {
                EndpointActor::spawn(
                    endpoint_id.to_string(),
                    Arc::clone(&self.config),
                    self.agent_command.clone(),
                    Arc::clone(&self.signaler),
                    Arc::clone(&self.transport),
                    Arc::clone(&self.sessions),
                )
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::transport::TransportError;
    use crate::session::MemorySessionStore;
    use async_trait::async_trait;
    use rk_protocol::{FinalOutcome, LiveUpdate};

    struct NullTransport;

    #[async_trait]
    impl ChatTransport for NullTransport {
        async fn edit_live(&self, _update: LiveUpdate) -> Result<(), TransportError> {
            Ok(())
        }

        async fn announce_queued(
            &self,
            _endpoint_id: &str,
            _depth: usize,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn send_final(
            &self,
            _endpoint_id: &str,
            _outcome: FinalOutcome,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn test_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        // `sh` is always resolvable; runs themselves are not started here
        config.agent.command = "sh".to_string();
        config
    }

    #[tokio::test]
    async fn test_interrupt_without_any_run_reports_not_running() {
        let relay = Relay::new(
            test_config(),
            Arc::new(NullTransport),
            Arc::new(MemorySessionStore::new()),
        )
        .expect("relay builds");

        let result = relay.interrupt("chat-1").await;
        assert!(matches!(
            result,
            Err(RelayError::Interrupt(InterruptError::NotRunning))
        ));
    }

    #[test]
    fn test_unresolvable_agent_command_fails_construction() {
        let mut config = RelayConfig::default();
        config.agent.command = "definitely-not-installed-xyz".to_string();

        let result = Relay::new(
            config,
            Arc::new(NullTransport),
            Arc::new(MemorySessionStore::new()),
        );
        assert!(result.is_err());
    }
}
