//! The per-endpoint orchestration actor.
//!
//! One actor task serializes all runs for its endpoint. While a run is
//! executing, the actor's select loop simultaneously consumes progress
//! events, ticks the display heartbeat, arms the interrupt escalation timer,
//! and keeps accepting commands so later submissions land in the backlog and
//! interrupts reach the in-flight process. Finalization is one routine
//! invoked from every terminal path; the backlog drains strictly in arrival
//! order afterwards.

use crate::config::models::RelayConfig;
use crate::display::panel::{render_panel, PreviewBuffer};
use crate::display::throttle::DisplayThrottler;
use crate::display::transport::ChatTransport;
use crate::endpoint::state::{EndpointRunState, RunProgress};
use crate::interrupt::controller::{InterruptController, InterruptError};
use crate::interrupt::signaler::ProcessSignaler;
use crate::relay::RelayError;
use crate::session::SessionStore;
use crate::supervisor::command::build_launch_spec;
use crate::supervisor::process::{RunLimits, RunningAgent, Supervisor};
use rk_protocol::{
    DisplaySlot, FinalOutcome, InterruptReply, LiveUpdate, ProgressEvent, RunOutcome, RunPhase,
    RunRequest, SubmitResult, TextKind, WaitingInfo,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

/// Commands accepted by an endpoint actor.
pub(crate) enum EndpointCommand {
    Submit {
        request: RunRequest,
        reply: oneshot::Sender<SubmitResult>,
    },
    Interrupt {
        reply: oneshot::Sender<Result<InterruptReply, InterruptError>>,
    },
}

/// Cheap handle for submitting work to an endpoint actor.
#[derive(Clone)]
pub struct EndpointHandle {
    cmd_tx: mpsc::Sender<EndpointCommand>,
}

impl EndpointHandle {
    /// Submit a request; never blocks on the run itself.
    pub async fn submit(&self, request: RunRequest) -> Result<SubmitResult, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(EndpointCommand::Submit {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RelayError::WorkerGone)?;
        reply_rx.await.map_err(|_| RelayError::WorkerGone)
    }

    /// Request cancellation of the endpoint's active run.
    pub async fn interrupt(&self) -> Result<InterruptReply, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(EndpointCommand::Interrupt { reply: reply_tx })
            .await
            .map_err(|_| RelayError::WorkerGone)?;
        let reply = reply_rx.await.map_err(|_| RelayError::WorkerGone)?;
        Ok(reply?)
    }
}

/// Owns one endpoint's state and executes its runs sequentially.
pub struct EndpointActor {
    endpoint_id: String,
    config: Arc<RelayConfig>,
    agent_command: PathBuf,
    supervisor: Supervisor,
    controller: InterruptController,
    transport: Arc<dyn ChatTransport>,
    sessions: Arc<dyn SessionStore>,
    state: EndpointRunState,
    cmd_rx: mpsc::Receiver<EndpointCommand>,
}

impl EndpointActor {
    /// Spawn the actor task for one endpoint and return its handle.
    pub fn spawn(
        endpoint_id: String,
        config: Arc<RelayConfig>,
        agent_command: PathBuf,
        signaler: Arc<dyn ProcessSignaler>,
        transport: Arc<dyn ChatTransport>,
        sessions: Arc<dyn SessionStore>,
    ) -> EndpointHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let grace = Duration::from_millis(config.run.interrupt_grace_ms);
        let limits = RunLimits {
            max_run: Duration::from_secs(config.run.max_run_secs),
            grace,
        };
        let actor = Self {
            endpoint_id,
            config,
            agent_command,
            supervisor: Supervisor::new(limits, Arc::clone(&signaler)),
            controller: InterruptController::new(signaler, grace),
            transport,
            sessions,
            state: EndpointRunState::default(),
            cmd_rx,
        };
        tokio::spawn(actor.run());

        EndpointHandle { cmd_tx }
    }

    /// The actor loop: idle until a submission arrives, then execute it and
    /// drain the backlog before going idle again.
    async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            debug_assert!(!self.state.active, "idle loop reached with a run active");
            match cmd {
                EndpointCommand::Submit { request, reply } => {
                    let _ = reply.send(SubmitResult::Started);
                    self.state.active = true;
                    self.execute(request).await;
                    while let Some(next) = self.state.backlog.pop_front() {
                        self.execute(next).await;
                    }
                    self.state.active = false;
                }
                EndpointCommand::Interrupt { reply } => {
                    // Idle endpoint: nothing to interrupt
                    let _ = reply.send(Err(InterruptError::NotRunning));
                }
            }
        }
    }

    /// One end-to-end run: launch, live progress, finalization.
    async fn execute(&mut self, request: RunRequest) {
        let mut throttler = DisplayThrottler::new(self.config.display, request.verbose);
        let mut progress = RunProgress::new(self.state.backlog.len());
        let mut preview = PreviewBuffer::default();

        progress.session_id = self.sessions.get(&self.endpoint_id).await;

        self.push_panel(&mut throttler, &progress, true).await;
        self.push_preview(&mut throttler, &preview, true).await;

        let spec = build_launch_spec(
            self.agent_command.clone(),
            &self.config.agent,
            &request.prompt,
            progress.session_id.clone(),
            self.working_dir(),
        );
        let transcript = self.transcript_path();
        let (events_tx, mut events_rx) = mpsc::channel(256);

        let agent = match self.supervisor.launch(spec, &transcript, events_tx).await {
            Ok(agent) => agent,
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint_id, error = %e, "agent spawn failed");
                let message = e.to_string();
                self.finish_run(
                    FinalOutcome::Errored { message },
                    None,
                    &mut throttler,
                    &mut progress,
                )
                .await;
                return;
            }
        };
        let RunningAgent {
            run_id,
            pid,
            mut outcome_rx,
            stream_aborts,
        } = agent;

        self.state.current_pid = pid;
        progress.phase = RunPhase::Running;
        self.push_panel(&mut throttler, &progress, true).await;

        let mut heartbeat = tokio::time::interval(throttler.heartbeat());
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut escalate_at: Option<Instant> = None;

        let outcome: Option<RunOutcome> = loop {
            let escalation = escalate_at.unwrap_or_else(far_future);
            tokio::select! {
                Some(event) = events_rx.recv() => {
                    throttler.note_event();
                    self.absorb_event(event, &mut progress, &mut preview);
                    self.push_panel(&mut throttler, &progress, false).await;
                    self.push_preview(&mut throttler, &preview, false).await;
                }
                _ = heartbeat.tick() => {
                    self.push_panel(&mut throttler, &progress, false).await;
                    self.push_preview(&mut throttler, &preview, false).await;
                }
                _ = tokio::time::sleep_until(escalation), if escalate_at.is_some() => {
                    escalate_at = None;
                    if let Some(pid) = self.state.current_pid {
                        self.controller.escalate(pid, &mut self.state.interrupt);
                    }
                    // Force-close the streams so exit is observed even if
                    // orphaned descendants keep the pipes open
                    for handle in &stream_aborts {
                        handle.abort();
                    }
                }
                Some(cmd) = self.cmd_rx.recv() => {
                    self.handle_mid_run_command(cmd, &mut throttler, &mut progress, &mut escalate_at).await;
                }
                outcome = &mut outcome_rx => {
                    break outcome.ok();
                }
            }
        };

        // Absorb events that were already in flight when the outcome won
        while let Ok(event) = events_rx.try_recv() {
            self.absorb_event(event, &mut progress, &mut preview);
        }

        tracing::info!(
            endpoint = %self.endpoint_id,
            run_id = %run_id,
            timed_out = outcome.as_ref().is_some_and(|o| o.timeout.is_some()),
            "run terminated"
        );

        let final_outcome =
            resolve_outcome(self.state.interrupt.is_some(), outcome.as_ref(), &progress);
        self.finish_run(final_outcome, outcome, &mut throttler, &mut progress)
            .await;
    }

    /// Commands arriving while a run is executing.
    async fn handle_mid_run_command(
        &mut self,
        cmd: EndpointCommand,
        throttler: &mut DisplayThrottler,
        progress: &mut RunProgress,
        escalate_at: &mut Option<Instant>,
    ) {
        match cmd {
            EndpointCommand::Submit { request, reply } => {
                self.state.backlog.push_back(request);
                let depth = self.state.backlog.len();
                let _ = reply.send(SubmitResult::Queued { depth });
                if let Err(e) = self.transport.announce_queued(&self.endpoint_id, depth).await {
                    tracing::warn!(endpoint = %self.endpoint_id, error = %e, "queue announcement failed");
                }
                // The panel must reflect the new depth immediately
                progress.queue_depth = depth;
                self.push_panel(throttler, progress, true).await;
            }
            EndpointCommand::Interrupt { reply } => {
                let result = match self.state.current_pid {
                    Some(pid) => self.controller.request(pid, &mut self.state.interrupt),
                    None => Err(InterruptError::NotRunning),
                };
                if matches!(result, Ok(InterruptReply::Requested)) {
                    *escalate_at = Some(Instant::now() + self.controller.force_after());
                }
                let _ = reply.send(result);
            }
        }
    }

    fn absorb_event(
        &mut self,
        event: ProgressEvent,
        progress: &mut RunProgress,
        preview: &mut PreviewBuffer,
    ) {
        if event.is_substantive() && self.state.waiting.is_some() {
            self.state.waiting = None;
            progress.waiting = None;
            progress.phase = RunPhase::Running;
        }

        match event {
            ProgressEvent::StepStarted => progress.steps += 1,
            ProgressEvent::StepFinished { .. } => {}
            ProgressEvent::TextChunk { content, kind } => match kind {
                TextKind::Final => preview.push_final(&content),
                TextKind::Reasoning => preview.push_reasoning(&content),
            },
            ProgressEvent::ToolInvoked { name, detail } => progress.note_tool(&name, &detail),
            ProgressEvent::Waiting {
                status,
                retry_after_secs,
            } => {
                let info = WaitingInfo {
                    status,
                    retry_after_secs,
                };
                self.state.waiting = Some(info.clone());
                progress.waiting = Some(info);
                progress.phase = RunPhase::Waiting;
            }
            ProgressEvent::RawLine { content } => progress.last_diagnostic = Some(content),
        }
    }

    /// The single cleanup routine behind every terminal path.
    ///
    /// Clears the interrupt trace, waiting info and process handle, persists
    /// a newly observed continuation id, performs one last forced display
    /// refresh, and delivers the terminal message. Only after this returns
    /// does the caller start the next backlog item.
    async fn finish_run(
        &mut self,
        final_outcome: FinalOutcome,
        outcome: Option<RunOutcome>,
        throttler: &mut DisplayThrottler,
        progress: &mut RunProgress,
    ) {
        self.controller.mark_terminated(&mut self.state.interrupt);
        progress.phase = RunPhase::Finalizing;
        progress.waiting = None;

        if let Some(sid) = outcome.and_then(|o| o.metadata.session_id) {
            progress.session_id = Some(sid.clone());
            if let Err(e) = self.sessions.put(&self.endpoint_id, sid).await {
                tracing::warn!(endpoint = %self.endpoint_id, error = %e, "failed to persist continuation id");
            }
        }

        self.push_panel(throttler, progress, true).await;

        if let Err(e) = self
            .transport
            .send_final(&self.endpoint_id, final_outcome)
            .await
        {
            tracing::error!(endpoint = %self.endpoint_id, error = %e, "terminal message delivery failed");
        }

        self.state.interrupt = None;
        self.state.waiting = None;
        self.state.current_pid = None;
    }

    async fn push_panel(&self, throttler: &mut DisplayThrottler, progress: &RunProgress, force: bool) {
        let content = render_panel(&self.endpoint_id, progress);
        if let Some(content) = throttler.decide(DisplaySlot::Panel, &content, force) {
            self.send_update(DisplaySlot::Panel, content, force).await;
        }
    }

    async fn push_preview(
        &self,
        throttler: &mut DisplayThrottler,
        preview: &PreviewBuffer,
        force: bool,
    ) {
        let content = preview.render();
        if let Some(content) = throttler.decide(DisplaySlot::Preview, &content, force) {
            self.send_update(DisplaySlot::Preview, content, force).await;
        }
    }

    async fn send_update(&self, slot: DisplaySlot, content: String, forced: bool) {
        let update = LiveUpdate {
            endpoint_id: self.endpoint_id.clone(),
            slot,
            content,
            forced,
        };
        // Push failures are transient: log and move on
        if let Err(e) = self.transport.edit_live(update).await {
            tracing::warn!(endpoint = %self.endpoint_id, ?slot, error = %e, "live message edit failed");
        }
    }

    fn working_dir(&self) -> PathBuf {
        self.config
            .working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn transcript_path(&self) -> PathBuf {
        let name: String = self
            .endpoint_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.config.log_dir().join(format!("{name}.log"))
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86400)
}

/// Resolve the terminal outcome for the user-visible result.
fn resolve_outcome(
    interrupted: bool,
    outcome: Option<&RunOutcome>,
    progress: &RunProgress,
) -> FinalOutcome {
    let Some(outcome) = outcome else {
        return FinalOutcome::Errored {
            message: "the run supervisor went away without reporting an outcome".to_string(),
        };
    };

    if interrupted {
        return FinalOutcome::Interrupted;
    }
    if let Some(message) = &outcome.timeout {
        return FinalOutcome::TimedOut {
            message: message.clone(),
        };
    }
    if let Some(text) = &outcome.metadata.final_text {
        return FinalOutcome::Completed { text: text.clone() };
    }

    FinalOutcome::NoOutput {
        fallback: synthesize_fallback(outcome, progress),
    }
}

/// Diagnostic stand-in for a run that exited without usable text.
fn synthesize_fallback(outcome: &RunOutcome, progress: &RunProgress) -> String {
    let mut out = String::from("The agent finished without producing a final answer.\n");

    match outcome.exit_code {
        Some(code) => out.push_str(&format!("exit code: {code}\n")),
        None => out.push_str("exit code: unknown\n"),
    }
    out.push_str(&format!(
        "steps: {}, tool calls: {}\n",
        progress.steps, progress.tools
    ));
    if !progress.recent_tools.is_empty() {
        out.push_str(&format!(
            "recent tools: {}\n",
            progress.recent_tools.join("; ")
        ));
    }
    if let Some(hint) = &outcome.metadata.rate_limit {
        match hint.retry_after_secs {
            Some(secs) => out.push_str(&format!(
                "the provider reported rate limiting (retry in ~{secs}s)\n"
            )),
            None => out.push_str("the provider reported rate limiting\n"),
        }
    }
    if !outcome.metadata.stderr_tail.is_empty() {
        out.push_str("recent diagnostics:\n");
        for line in &outcome.metadata.stderr_tail {
            out.push_str(&format!("  {line}\n"));
        }
    }

    out
}
