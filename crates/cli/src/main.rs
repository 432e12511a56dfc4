mod console;

use clap::Parser;
use colored::Colorize;
use console::ConsoleTransport;
use rk_core::config::load_config;
use rk_core::relay::Relay;
use rk_core::session::FileSessionStore;
use rk_protocol::{FinalOutcome, RunRequest, SubmitResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Relay one request to the configured coding agent and stream its progress.
#[derive(Parser, Debug)]
#[command(name = "relay", version)]
struct Args {
    /// Project root containing the .relay-kit/ directory.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Endpoint to run against.
    #[arg(long, default_value = "console")]
    endpoint: String,

    /// Use the more talkative display cadence.
    #[arg(long)]
    verbose: bool,

    /// The instruction to relay to the agent.
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err(color_eyre::eyre::eyre!("a prompt is required"));
    }

    let config = load_config(&args.root).await?;
    let sessions = FileSessionStore::load(args.root.join(".relay-kit").join("sessions.json"))
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e))?;
    let (transport, mut final_rx) = ConsoleTransport::new();

    let relay = Relay::new(config, Arc::new(transport), Arc::new(sessions))?;

    let request = RunRequest {
        prompt,
        requested_by: whoami(),
        verbose: args.verbose,
    };
    match relay.submit(&args.endpoint, request).await? {
        SubmitResult::Started => {}
        SubmitResult::Queued { depth } => {
            println!("queued at position {depth}");
        }
    }

    let Some(outcome) = final_rx.recv().await else {
        return Err(color_eyre::eyre::eyre!("relay ended without an outcome"));
    };

    match outcome {
        FinalOutcome::Completed { text } => {
            println!("\n{}", text);
            Ok(())
        }
        FinalOutcome::NoOutput { fallback } => {
            println!("\n{}", fallback.yellow());
            Ok(())
        }
        FinalOutcome::Interrupted => {
            println!("\n{}", "run interrupted".yellow());
            Ok(())
        }
        FinalOutcome::TimedOut { message } => {
            Err(color_eyre::eyre::eyre!("timed out: {message}"))
        }
        FinalOutcome::Errored { message } => Err(color_eyre::eyre::eyre!(message)),
    }
}

fn whoami() -> String {
    std::env::var("USER").unwrap_or_else(|_| "console".to_string())
}
