//! Process spawning, stream wiring, timeout enforcement and outcome delivery.

use crate::events::{EventParser, StderrMonitor};
use crate::interrupt::signaler::{ProcessSignaler, SignalKind};
use chrono::Utc;
use rk_protocol::{ProgressEvent, RunMetadata, RunOutcome, TextKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Read buffer size for stdout chunks.
const STDOUT_CHUNK_BYTES: usize = 8192;

/// How long to wait for the output streams to drain after process exit
/// before force-closing them (orphaned grandchildren can hold the pipes).
const STREAM_DRAIN: Duration = Duration::from_secs(1);

/// Everything needed to start one agent process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub session_id: Option<String>,
}

/// Timeout and grace-window limits applied to every run.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    pub max_run: Duration,
    pub grace: Duration,
}

/// Errors that prevent a run from starting.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("failed to spawn agent process '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("failed to open transcript log at {path}: {source}")]
    TranscriptOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("agent process is missing its {stream} pipe")]
    MissingPipe { stream: &'static str },
}

/// Handle to an in-flight agent process.
///
/// Owned by the orchestrator for the run's duration; dropping it does not
/// kill the process (the supervise task owns the child), it only detaches
/// the outcome receiver.
pub struct RunningAgent {
    pub run_id: Uuid,
    pub pid: Option<u32>,

    /// Resolves exactly once with the terminal outcome.
    pub outcome_rx: oneshot::Receiver<RunOutcome>,

    /// Force-close handles for the stream reader tasks.
    pub stream_aborts: Vec<AbortHandle>,
}

/// Collected from stdout while the process runs.
#[derive(Default)]
struct StdoutCollector {
    session_id: Option<String>,
    final_text: String,
}

impl StdoutCollector {
    fn observe(&mut self, event: &ProgressEvent) {
        if let ProgressEvent::TextChunk {
            content,
            kind: TextKind::Final,
        } = event
        {
            self.final_text.push_str(content);
        }
    }
}

/// Spawns and supervises agent processes.
pub struct Supervisor {
    limits: RunLimits,
    signaler: Arc<dyn ProcessSignaler>,
}

impl Supervisor {
    pub fn new(limits: RunLimits, signaler: Arc<dyn ProcessSignaler>) -> Self {
        Self { limits, signaler }
    }

    /// Spawn the agent process and wire up its streams.
    ///
    /// The process is started as a process-group leader so group-wide
    /// signaling reaches its own children. Both output streams are mirrored
    /// verbatim into the transcript log behind a timestamped run separator;
    /// stdout additionally flows through the event parser to `events_tx`,
    /// stderr through the diagnostic/rate-limit monitor.
    ///
    /// Exactly one [`RunOutcome`] is delivered on the returned handle's
    /// `outcome_rx`, whether the process exits, times out, or is killed.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the transcript log cannot be opened or
    /// the process cannot be spawned; no handle exists in that case.
    pub async fn launch(
        &self,
        spec: LaunchSpec,
        transcript_path: &Path,
        events_tx: mpsc::Sender<ProgressEvent>,
    ) -> Result<RunningAgent, SpawnError> {
        let run_id = Uuid::new_v4();

        // 1. Open the transcript log and write the run separator
        let mut transcript = open_transcript(transcript_path).await?;
        let separator = format!(
            "\n==== run {} at {} ====\n",
            run_id,
            Utc::now().to_rfc3339()
        );
        transcript
            .write_all(separator.as_bytes())
            .await
            .map_err(|source| SpawnError::TranscriptOpen {
                path: transcript_path.to_path_buf(),
                source,
            })?;

        // 2. Spawn the agent as a process-group leader
        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| SpawnError::Spawn {
            command: spec.command.display().to_string(),
            source,
        })?;
        let pid = child.id();
        tracing::info!(
            run_id = %run_id,
            pid,
            command = %spec.command.display(),
            session_id = spec.session_id.as_deref(),
            "agent process spawned"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or(SpawnError::MissingPipe { stream: "stdout" })?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SpawnError::MissingPipe { stream: "stderr" })?;

        // 3. Single transcript writer keeps the log append-only and ordered
        let (log_tx, mut log_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        tokio::spawn(async move {
            while let Some(buf) = log_rx.recv().await {
                if transcript.write_all(&buf).await.is_err() {
                    break;
                }
            }
            let _ = transcript.flush().await;
        });

        let collector = Arc::new(Mutex::new(StdoutCollector::default()));
        let monitor = Arc::new(Mutex::new(StderrMonitor::new()));

        // 4. Stdout: chunks -> transcript + parser -> event sink
        let stdout_task = {
            let log_tx = log_tx.clone();
            let collector = Arc::clone(&collector);
            tokio::spawn(async move {
                let mut stdout = stdout;
                let mut parser = EventParser::new();
                let mut buf = [0u8; STDOUT_CHUNK_BYTES];
                loop {
                    match stdout.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            let chunk = &buf[..n];
                            let _ = log_tx.send(chunk.to_vec());
                            let events = parser.push_chunk(chunk);
                            forward(&events, &collector, &parser, &events_tx).await;
                        }
                    }
                }
                let events = parser.finish();
                forward(&events, &collector, &parser, &events_tx).await;
            })
        };

        // 5. Stderr: lines -> transcript + diagnostic monitor
        let stderr_task = {
            let monitor = Arc::clone(&monitor);
            tokio::spawn(async move {
                let mut lines = LinesStream::new(BufReader::new(stderr).lines());
                while let Some(Ok(line)) = lines.next().await {
                    let _ = log_tx.send(format!("{line}\n").into_bytes());
                    monitor
                        .lock()
                        .unwrap_or_else(|poison| poison.into_inner())
                        .observe_line(&line);
                }
            })
        };

        let stream_aborts = vec![stdout_task.abort_handle(), stderr_task.abort_handle()];

        // 6. Supervise: wait for exit or the absolute timeout, then report
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let limits = self.limits;
        let signaler = Arc::clone(&self.signaler);
        let aborts = stream_aborts.clone();
        tokio::spawn(async move {
            let (exit_code, timeout) = tokio::select! {
                status = child.wait() => {
                    (status.ok().and_then(|s| s.code()), None)
                }
                _ = tokio::time::sleep(limits.max_run) => {
                    let message = format!(
                        "run exceeded the maximum duration of {}s and was terminated",
                        limits.max_run.as_secs()
                    );
                    tracing::warn!(run_id = %run_id, pid, "{message}");

                    if let Some(pid) = pid {
                        let _ = signaler.signal(pid, SignalKind::Graceful);
                    }
                    match tokio::time::timeout(limits.grace, child.wait()).await {
                        Ok(status) => (status.ok().and_then(|s| s.code()), Some(message)),
                        Err(_) => {
                            if let Some(pid) = pid {
                                let _ = signaler.signal(pid, SignalKind::Forceful);
                            }
                            for handle in &aborts {
                                handle.abort();
                            }
                            let _ = child.wait().await;
                            (None, Some(message))
                        }
                    }
                }
            };

            // Bounded drain so orphaned pipe holders cannot stall the
            // terminal notification
            let drain = async {
                let _ = stdout_task.await;
                let _ = stderr_task.await;
            };
            if tokio::time::timeout(STREAM_DRAIN, drain).await.is_err() {
                for handle in &aborts {
                    handle.abort();
                }
            }

            let metadata = {
                let collector = collector
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner());
                let monitor = monitor
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner());
                let final_text = collector.final_text.trim();
                RunMetadata {
                    session_id: collector.session_id.clone(),
                    rate_limit: monitor.rate_limit(),
                    stderr_tail: monitor.tail(),
                    final_text: (!final_text.is_empty()).then(|| final_text.to_string()),
                }
            };

            let _ = outcome_tx.send(RunOutcome {
                exit_code,
                timeout,
                metadata,
            });
        });

        Ok(RunningAgent {
            run_id,
            pid,
            outcome_rx,
            stream_aborts,
        })
    }
}

/// Forward a batch of parsed events to the sink, updating the collector.
async fn forward(
    events: &[ProgressEvent],
    collector: &Arc<Mutex<StdoutCollector>>,
    parser: &EventParser,
    events_tx: &mpsc::Sender<ProgressEvent>,
) {
    if events.is_empty() {
        return;
    }
    {
        let mut collector = collector
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        for event in events {
            collector.observe(event);
        }
        if let Some(sid) = parser.latest_session_id() {
            collector.session_id = Some(sid.to_string());
        }
    }
    for event in events {
        // The receiver may already have moved to finalization; keep
        // draining so the collector and transcript stay complete.
        let _ = events_tx.send(event.clone()).await;
    }
}

async fn open_transcript(path: &Path) -> Result<tokio::fs::File, SpawnError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SpawnError::TranscriptOpen {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
    }

    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|source| SpawnError::TranscriptOpen {
            path: path.to_path_buf(),
            source,
        })
}
